//! Device assembly: the simulated rig by default, Raspberry Pi peripherals
//! with the `hardware` feature.
#![cfg_attr(feature = "hardware", allow(dead_code))]

use std::str::FromStr;
use std::sync::Arc;

use roaster_core::RoasterBuilder;
use roaster_hardware::{SimDialKind, SimParams, SimProbe, SimPwmKind, SimRig};
use roaster_traits::MonotonicClock;

/// Parse an environment knob, ignoring (and logging) malformed values.
fn env_knob<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(name, value = %raw, "ignoring malformed simulation knob");
            None
        }
    }
}

/// Simulation parameters from `ROASTER_SIM_*`.
fn sim_params(cfg: &roaster_config::Config) -> SimParams {
    let defaults = SimParams::default();
    SimParams {
        time_scale: env_knob("ROASTER_SIM_TIME_SCALE").unwrap_or(defaults.time_scale),
        intake_start_f: env_knob("ROASTER_SIM_INTAKE_START_F").unwrap_or(defaults.intake_start_f),
        bean_start_f: env_knob("ROASTER_SIM_BEAN_START_F").unwrap_or(defaults.bean_start_f),
        fan_raw: env_knob("ROASTER_SIM_FAN_RAW").unwrap_or(defaults.fan_raw),
        heat_raw: env_knob("ROASTER_SIM_HEAT_RAW").unwrap_or(defaults.heat_raw),
        max_duty: roaster_core::util::max_for_bits(cfg.actuator.duty_bits),
        ..defaults
    }
}

/// Which thermocouples `ROASTER_SIM_TC_FAIL` breaks: `bean`, `intake`, or
/// anything else truthy for both.
fn tc_faults() -> (bool, bool) {
    match std::env::var("ROASTER_SIM_TC_FAIL").ok().as_deref().map(str::trim) {
        None | Some("" | "0" | "false") => (false, false),
        Some("bean") => (true, false),
        Some("intake") => (false, true),
        Some(_) => (true, true),
    }
}

/// Builder wired to a fresh simulated rig.
pub fn sim_builder(cfg: &roaster_config::Config) -> RoasterBuilder {
    let params = sim_params(cfg);
    tracing::info!(
        time_scale = params.time_scale,
        heat_raw = params.heat_raw,
        fan_raw = params.fan_raw,
        "using simulated rig"
    );
    let sim = SimRig::new(params, Arc::new(MonotonicClock::new()));
    let (fail_bean, fail_intake) = tc_faults();
    sim.inject_faults(fail_bean, fail_intake, false);
    if let Some(g) = env_knob::<f32>("ROASTER_SIM_CHARGE_G") {
        sim.load_charge(g);
    }

    roaster_core::Roaster::builder()
        .with_dials(sim.dial(SimDialKind::Fan), sim.dial(SimDialKind::Heat))
        .with_thermocouples(
            sim.thermocouple(SimProbe::Bean),
            sim.thermocouple(SimProbe::Intake),
        )
        .with_load_cell(sim.load_cell())
        .with_outputs(sim.pwm(SimPwmKind::Heater), sim.pwm(SimPwmKind::Fan))
        .with_button(sim.button())
}

#[cfg(feature = "hardware")]
fn pin(value: Option<u8>, name: &str) -> eyre::Result<u8> {
    value.ok_or_else(|| eyre::eyre!("invalid configuration: pins.{name} missing"))
}

/// Builder wired to the real peripherals named in `[pins]`.
#[cfg(feature = "hardware")]
pub fn hardware_builder(cfg: &roaster_config::Config) -> eyre::Result<RoasterBuilder> {
    use eyre::WrapErr;
    use roaster_hardware::hardware::{AdcDial, HardwareLoadCell, HardwareThermocouple};
    use roaster_hardware::{gpio_button::GpioButton, pwm::HardwarePwm};

    let p = &cfg.pins;
    let (fan_dial, heat_dial) = AdcDial::pair(
        pin(p.adc_spi_ss, "adc_spi_ss")?,
        p.fan_adc_channel,
        p.heat_adc_channel,
    )
    .wrap_err("open dial adc")?;
    let bean = HardwareThermocouple::new(pin(p.bean_tc_ss, "bean_tc_ss")?)
        .wrap_err("open bean thermocouple")?;
    let intake = HardwareThermocouple::new(pin(p.intake_tc_ss, "intake_tc_ss")?)
        .wrap_err("open intake thermocouple")?;
    let load_cell = HardwareLoadCell::new(pin(p.hx711_dt, "hx711_dt")?, pin(p.hx711_sck, "hx711_sck")?)
        .wrap_err("open hx711")?;

    let freq = f64::from(cfg.actuator.pwm_frequency_hz);
    let max_duty = roaster_core::util::max_for_bits(cfg.actuator.duty_bits);
    let heater = HardwarePwm::new(pin(p.heater_pwm, "heater_pwm")?, freq, max_duty)
        .wrap_err("open heater pwm")?;
    let fan = HardwarePwm::new(pin(p.fan_pwm, "fan_pwm")?, freq, max_duty)
        .wrap_err("open fan pwm")?;

    let mut builder = roaster_core::Roaster::builder()
        .with_dials(fan_dial, heat_dial)
        .with_thermocouples(bean, intake)
        .with_load_cell(load_cell)
        .with_outputs(heater, fan);
    if let Some(button_pin) = p.advance_button {
        builder = builder.with_button(GpioButton::new(button_pin).wrap_err("open advance button")?);
    }
    tracing::info!("using hardware rig");
    Ok(builder)
}

/// Builder for whichever backend this binary was compiled with.
pub fn builder(cfg: &roaster_config::Config) -> eyre::Result<RoasterBuilder> {
    #[cfg(feature = "hardware")]
    {
        hardware_builder(cfg)
    }
    #[cfg(not(feature = "hardware"))]
    {
        Ok(sim_builder(cfg))
    }
}
