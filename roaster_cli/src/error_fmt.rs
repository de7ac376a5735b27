//! Human-readable error descriptions and structured JSON error formatting.

use roaster_core::error::{BuildError, Channel, RoasterError, SensorError};

fn sensor_hint(channel: Channel, source: &SensorError) -> String {
    let (device, wiring) = match channel {
        Channel::FanDial | Channel::HeatDial => (
            format!("{channel} dial"),
            "MCP3208 chip select (pins.adc_spi_ss) and the dial's ADC channel",
        ),
        Channel::BeanTemp | Channel::IntakeTemp => (
            format!("{channel} thermocouple"),
            "the MAX6675 chip select (pins.bean_tc_ss / pins.intake_tc_ss) and the probe leads",
        ),
        Channel::Weight => (
            "load cell".to_owned(),
            "HX711 DT/SCK pins (pins.hx711_dt / pins.hx711_sck) and the load-cell wiring",
        ),
    };
    let cause = match source {
        SensorError::Timeout => "The device did not answer within hardware.sensor_read_timeout_ms",
        SensorError::Hardware(_) => "Bus or wiring fault, or an open-circuit probe",
        SensorError::Implausible(_) => {
            "The probe returned a value outside thresholds.min_plausible_f..max_plausible_f"
        }
    };
    format!(
        "What happened: The {device} read failed ({source}).\nLikely causes: {cause}.\nHow to fix: Check {wiring}, then rerun `roaster self-check`."
    )
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDial => {
                "What happened: No dials were provided to the controller.\nLikely causes: The dial ADC failed to initialize or was not wired into the builder.\nHow to fix: Ensure both dials are created and passed via with_dials(...).".to_string()
            }
            BuildError::MissingThermocouple => {
                "What happened: A thermocouple was not provided to the controller.\nLikely causes: A MAX6675 failed to initialize.\nHow to fix: Ensure both probes are created and passed via with_thermocouples(...).".to_string()
            }
            BuildError::MissingLoadCell => {
                "What happened: No load cell was provided to the controller.\nLikely causes: The HX711 failed to initialize.\nHow to fix: Ensure the load cell is created and passed via with_load_cell(...).".to_string()
            }
            BuildError::MissingPwm => {
                "What happened: A PWM output was not provided to the controller.\nLikely causes: The heater or fan PWM channel failed to open.\nHow to fix: Ensure both outputs are passed via with_outputs(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/roaster.toml for a sample."
            ),
        };
    }

    if let Some(re) = err.downcast_ref::<RoasterError>() {
        return match re {
            RoasterError::Config(msg) if msg.starts_with("read config") => format!(
                "What happened: The config file could not be read ({msg}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass an existing file with --config, or omit it to use built-in defaults."
            ),
            RoasterError::Config(msg) if msg.starts_with("parse config") => format!(
                "What happened: The config file is not valid TOML for this controller ({msg}).\nLikely causes: A typo, a wrong value type, or a misplaced section.\nHow to fix: Compare with etc/roaster.toml and fix the reported line."
            ),
            RoasterError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/roaster.toml for a sample."
            ),
            RoasterError::Sensor { channel, source } => sensor_hint(*channel, source),
            RoasterError::Actuator(msg) => format!(
                "What happened: Writing heater/fan duty failed ({msg}).\nLikely causes: PWM channel not enabled, wrong pins.heater_pwm / pins.fan_pwm, or missing permissions.\nHow to fix: Enable the PWM overlay, check [pins], then rerun. Outputs were driven to zero."
            ),
            RoasterError::CalibrationTimeout => "What happened: Scale calibration timed out.\nLikely causes: HX711 not answering or calibration.timeout_ms too low.\nHow to fix: Check the load cell wiring and raise calibration.timeout_ms.".to_string(),
            RoasterError::Calibration(msg) => format!(
                "What happened: Scale calibration failed ({msg}).\nLikely causes: The charge was not on the scale during Calibrate.\nHow to fix: Load the charge before advancing out of Load."
            ),
            // Fallback to generic for other domain errors
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from hardware init
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("hx711") && lower.contains("timeout") {
        return "What happened: HX711 did not produce data within the configured timeout.\nLikely causes: Wrong DT/SCK pins, wiring/power issues, or timeout configured too low.\nHow to fix: Check [pins] in the config, verify 5V/GND, and raise hardware.sensor_read_timeout_ms.".to_string();
    }

    if lower.contains("open ") && (lower.contains("gpio") || lower.contains("spi") || lower.contains("pwm")) {
        return format!(
            "What happened: Failed to initialize hardware ({msg}).\nLikely causes: Incorrect pin numbers, SPI/PWM not enabled, or insufficient permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process can access GPIO, SPI and PWM."
        );
    }

    if lower.contains("invalid configuration") || (lower.contains("pins.") && lower.contains("missing")) {
        return format!(
            "What happened: Configuration is invalid or incomplete ({msg}).\nLikely causes: Missing [pins] entries required by the hardware backend.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 config, 4 actuator, 5 sensor, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<RoasterError>() {
        Some(RoasterError::Config(_)) => 3,
        Some(RoasterError::Actuator(_)) => 4,
        Some(RoasterError::Sensor { .. } | RoasterError::CalibrationTimeout) => 5,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<RoasterError>() {
        Some(RoasterError::Config(_)) => "Config",
        Some(RoasterError::Actuator(_)) => "Actuator",
        Some(RoasterError::Sensor { .. }) => "Sensor",
        Some(RoasterError::CalibrationTimeout | RoasterError::Calibration(_)) => "Calibration",
        Some(RoasterError::Sink(_)) => "Sink",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    });
    if let Some(RoasterError::Sensor { channel, source }) = err.downcast_ref::<RoasterError>() {
        obj["details"] = json!({ "channel": channel.as_str(), "error": source.to_string() });
    }
    obj.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_errors_name_the_device() {
        let err = eyre::Report::new(RoasterError::Sensor {
            channel: Channel::BeanTemp,
            source: SensorError::Hardware("thermocouple open circuit".into()),
        });
        let msg = humanize(&err);
        assert!(msg.starts_with("What happened: The bean thermocouple read failed"));
        assert_eq!(exit_code_for_error(&err), 5);
    }

    #[test]
    fn wrapped_config_errors_keep_their_code() {
        use eyre::WrapErr;
        let err: eyre::Result<()> = Err(RoasterError::Config("sampling.tick_ms must be >= 1".into()).into());
        let err = err.wrap_err("startup").unwrap_err();
        assert_eq!(exit_code_for_error(&err), 3);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Config");
    }

    #[test]
    fn unknown_errors_fall_back_to_generic_text() {
        let err = eyre::eyre!("boom");
        assert!(humanize(&err).starts_with("Something went wrong."));
        assert_eq!(exit_code_for_error(&err), 1);
    }
}
