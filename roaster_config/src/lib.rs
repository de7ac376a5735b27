#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the roaster controller.
//!
//! `Config` and its sections are deserialized from TOML and checked by
//! [`Config::validate`]. Every section has defaults, so an empty file is a
//! valid simulation config.
use serde::Deserialize;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Pins {
    pub hx711_dt: Option<u8>,
    pub hx711_sck: Option<u8>,
    /// Hardware PWM channel (0 or 1) driving the heater SSR.
    pub heater_pwm: Option<u8>,
    /// Hardware PWM channel (0 or 1) driving the fan.
    pub fan_pwm: Option<u8>,
    /// Chip select of the MCP3208 carrying both dials.
    pub adc_spi_ss: Option<u8>,
    #[serde(default)]
    pub fan_adc_channel: u8,
    #[serde(default = "default_heat_adc_channel")]
    pub heat_adc_channel: u8,
    pub bean_tc_ss: Option<u8>,
    pub intake_tc_ss: Option<u8>,
    pub advance_button: Option<u8>,
}

fn default_heat_adc_channel() -> u8 {
    1
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Sampling {
    /// Control loop period.
    pub tick_ms: u64,
    /// Minimum interval between thermocouple reads.
    pub thermocouple_ms: u64,
    /// Minimum interval between load-cell reads.
    pub load_cell_ms: u64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            thermocouple_ms: 250,
            load_cell_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Thresholds {
    /// Preheat ends once the intake reaches this temperature.
    pub preheat_temp_f: f32,
    /// Roast ends once the heat dial drops to or below this percentage.
    pub drop_heat_percent: u8,
    /// Drop ends once the beans cool below this temperature.
    pub done_bean_temp_f: f32,
    /// Temperatures outside [min, max] are rejected as implausible readings.
    pub min_plausible_f: f32,
    pub max_plausible_f: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            preheat_temp_f: 325.0,
            drop_heat_percent: 5,
            done_bean_temp_f: 150.0,
            min_plausible_f: -40.0,
            max_plausible_f: 1000.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Roast {
    /// Green charge weight in scale units.
    pub target_charge_g: f32,
    /// Advance Load → Calibrate automatically once half the charge is on the scale.
    pub auto_load_advance: bool,
}

impl Default for Roast {
    fn default() -> Self {
        Self {
            target_charge_g: 100.0,
            auto_load_advance: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMode {
    /// Tare/calibrate inline, halting the loop for the call.
    #[default]
    Blocking,
    /// Accumulate samples across ticks while reporting a calibrating status.
    Sampled,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationActuator {
    /// Keep driving the dial-commanded duty.
    #[default]
    Hold,
    /// Force heater and fan to zero until calibration finishes.
    Zero,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Calibration {
    pub mode: CalibrationMode,
    /// Load-cell samples averaged per tare/calibrate.
    pub samples: u32,
    pub timeout_ms: u64,
    pub actuator: CalibrationActuator,
    /// Starting calibration until the first tare/calibrate of the session.
    pub gain_units_per_count: f32,
    pub zero_counts: i32,
    pub offset_units: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            mode: CalibrationMode::Blocking,
            samples: 10,
            timeout_ms: 5_000,
            actuator: CalibrationActuator::Hold,
            gain_units_per_count: 0.01,
            zero_counts: 0,
            offset_units: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Actuator {
    /// Dial ADC resolution.
    pub adc_bits: u8,
    /// PWM duty resolution.
    pub duty_bits: u8,
    pub pwm_frequency_hz: u32,
}

impl Default for Actuator {
    fn default() -> Self {
        Self {
            adc_bits: 12,
            duty_bits: 12,
            pwm_frequency_hz: 5_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Telemetry {
    pub interval_ms: u64,
    /// Append a column listing faulted channels.
    pub include_faults: bool,
    /// Write lines to this file instead of stdout.
    pub file: Option<String>,
    /// Hand lines to a writer thread instead of writing inline.
    pub background: bool,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            interval_ms: 250,
            include_faults: false,
            file: None,
            background: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Display {
    pub fps: u32,
}

impl Default for Display {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Hardware {
    /// Max time to wait for HX711 data-ready before failing a read
    pub sensor_read_timeout_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sensor_read_timeout_ms: 150,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub sampling: Sampling,
    pub thresholds: Thresholds,
    pub roast: Roast,
    pub calibration: Calibration,
    pub actuator: Actuator,
    pub telemetry: Telemetry,
    pub display: Display,
    pub logging: Logging,
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {e}", path.display()))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {e}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn plausible_temp(name: &str, v: f32) -> eyre::Result<()> {
    if !v.is_finite() {
        eyre::bail!("{name} must be finite");
    }
    if v < 0.0 {
        eyre::bail!("{name} must be >= 0");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sampling
        if self.sampling.tick_ms == 0 {
            eyre::bail!("sampling.tick_ms must be >= 1");
        }
        if self.sampling.thermocouple_ms == 0 {
            eyre::bail!("sampling.thermocouple_ms must be >= 1");
        }
        if self.sampling.load_cell_ms == 0 {
            eyre::bail!("sampling.load_cell_ms must be >= 1");
        }

        // Thresholds
        plausible_temp("thresholds.preheat_temp_f", self.thresholds.preheat_temp_f)?;
        plausible_temp(
            "thresholds.done_bean_temp_f",
            self.thresholds.done_bean_temp_f,
        )?;
        if self.thresholds.drop_heat_percent > 100 {
            eyre::bail!("thresholds.drop_heat_percent must be in [0, 100]");
        }
        if !self.thresholds.min_plausible_f.is_finite()
            || !self.thresholds.max_plausible_f.is_finite()
            || self.thresholds.min_plausible_f >= self.thresholds.max_plausible_f
        {
            eyre::bail!("thresholds.min_plausible_f must be below thresholds.max_plausible_f");
        }
        if self.thresholds.preheat_temp_f > self.thresholds.max_plausible_f {
            eyre::bail!("thresholds.preheat_temp_f is above thresholds.max_plausible_f");
        }
        if self.thresholds.done_bean_temp_f >= self.thresholds.preheat_temp_f {
            eyre::bail!("thresholds.done_bean_temp_f must be below thresholds.preheat_temp_f");
        }

        // Roast
        if !(self.roast.target_charge_g.is_finite() && self.roast.target_charge_g > 0.0) {
            eyre::bail!("roast.target_charge_g must be > 0");
        }

        // Calibration
        if self.calibration.samples == 0 {
            eyre::bail!("calibration.samples must be >= 1");
        }
        if self.calibration.timeout_ms == 0 {
            eyre::bail!("calibration.timeout_ms must be >= 1");
        }
        if !self.calibration.gain_units_per_count.is_finite()
            || self.calibration.gain_units_per_count == 0.0
        {
            eyre::bail!("calibration.gain_units_per_count must be finite and non-zero");
        }
        if !self.calibration.offset_units.is_finite() {
            eyre::bail!("calibration.offset_units must be finite");
        }

        // Actuator
        if !(1..=16).contains(&self.actuator.adc_bits) {
            eyre::bail!("actuator.adc_bits must be in [1, 16]");
        }
        if !(1..=20).contains(&self.actuator.duty_bits) {
            eyre::bail!("actuator.duty_bits must be in [1, 20]");
        }
        if self.actuator.pwm_frequency_hz == 0 {
            eyre::bail!("actuator.pwm_frequency_hz must be > 0");
        }

        // Telemetry / display
        if self.telemetry.interval_ms == 0 {
            eyre::bail!("telemetry.interval_ms must be >= 1");
        }
        if self.display.fps == 0 || self.display.fps > 1000 {
            eyre::bail!("display.fps must be in [1, 1000]");
        }

        // Hardware
        if self.hardware.sensor_read_timeout_ms == 0 {
            eyre::bail!("hardware.sensor_read_timeout_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_a_valid_sim_config() {
        let cfg = load_toml("").expect("parse");
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.sampling.thermocouple_ms, 250);
        assert_eq!(cfg.sampling.load_cell_ms, 100);
        assert_eq!(cfg.calibration.mode, CalibrationMode::Blocking);
        assert!(!cfg.roast.auto_load_advance);
    }

    #[test]
    fn modes_parse_lowercase() {
        let cfg = load_toml(
            r#"
[calibration]
mode = "sampled"
actuator = "zero"
"#,
        )
        .expect("parse");
        assert_eq!(cfg.calibration.mode, CalibrationMode::Sampled);
        assert_eq!(cfg.calibration.actuator, CalibrationActuator::Zero);
    }
}
