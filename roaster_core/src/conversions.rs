//! `From` implementations bridging `roaster_config` types to `roaster_core` types.

use crate::calibration::Calibration;
use crate::config::{
    ActuatorCfg, ActuatorPolicy, CalibrationCfg, CalibrationMode, DisplayCfg, PhaseThresholds,
    PlausibleRange, RoastCfg, RoasterSettings, SamplingCfg, TelemetryCfg,
};

// ── Sampling ─────────────────────────────────────────────────────────────────

impl From<&roaster_config::Config> for SamplingCfg {
    fn from(c: &roaster_config::Config) -> Self {
        Self {
            tick_ms: c.sampling.tick_ms,
            thermocouple_ms: c.sampling.thermocouple_ms,
            load_cell_ms: c.sampling.load_cell_ms,
            read_timeout_ms: c.hardware.sensor_read_timeout_ms,
        }
    }
}

// ── Thresholds ───────────────────────────────────────────────────────────────

impl From<&roaster_config::Thresholds> for PhaseThresholds {
    fn from(c: &roaster_config::Thresholds) -> Self {
        Self {
            preheat_temp_f: c.preheat_temp_f,
            drop_heat_percent: c.drop_heat_percent,
            done_bean_temp_f: c.done_bean_temp_f,
        }
    }
}

impl From<&roaster_config::Thresholds> for PlausibleRange {
    fn from(c: &roaster_config::Thresholds) -> Self {
        Self {
            min_f: c.min_plausible_f,
            max_f: c.max_plausible_f,
        }
    }
}

// ── Roast ────────────────────────────────────────────────────────────────────

impl From<&roaster_config::Roast> for RoastCfg {
    fn from(c: &roaster_config::Roast) -> Self {
        Self {
            target_charge_units: c.target_charge_g,
            auto_load_advance: c.auto_load_advance,
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<roaster_config::CalibrationMode> for CalibrationMode {
    fn from(m: roaster_config::CalibrationMode) -> Self {
        match m {
            roaster_config::CalibrationMode::Blocking => Self::Blocking,
            roaster_config::CalibrationMode::Sampled => Self::Sampled,
        }
    }
}

impl From<roaster_config::CalibrationActuator> for ActuatorPolicy {
    fn from(a: roaster_config::CalibrationActuator) -> Self {
        match a {
            roaster_config::CalibrationActuator::Hold => Self::Hold,
            roaster_config::CalibrationActuator::Zero => Self::Zero,
        }
    }
}

impl From<&roaster_config::Calibration> for CalibrationCfg {
    fn from(c: &roaster_config::Calibration) -> Self {
        Self {
            mode: c.mode.into(),
            samples: c.samples,
            timeout_ms: c.timeout_ms,
            actuator: c.actuator.into(),
        }
    }
}

impl From<&roaster_config::Calibration> for Calibration {
    fn from(c: &roaster_config::Calibration) -> Self {
        Self {
            gain_units_per_count: c.gain_units_per_count,
            zero_counts: c.zero_counts,
            offset_units: c.offset_units,
        }
    }
}

// ── Outputs ──────────────────────────────────────────────────────────────────

impl From<&roaster_config::Actuator> for ActuatorCfg {
    fn from(c: &roaster_config::Actuator) -> Self {
        Self {
            adc_bits: c.adc_bits,
            duty_bits: c.duty_bits,
        }
    }
}

impl From<&roaster_config::Telemetry> for TelemetryCfg {
    fn from(c: &roaster_config::Telemetry) -> Self {
        Self {
            interval_ms: c.interval_ms,
            include_faults: c.include_faults,
        }
    }
}

impl From<&roaster_config::Display> for DisplayCfg {
    fn from(c: &roaster_config::Display) -> Self {
        Self { fps: c.fps }
    }
}

// ── Whole config ─────────────────────────────────────────────────────────────

impl From<&roaster_config::Config> for RoasterSettings {
    fn from(c: &roaster_config::Config) -> Self {
        Self {
            sampling: c.into(),
            thresholds: (&c.thresholds).into(),
            plausible: (&c.thresholds).into(),
            roast: (&c.roast).into(),
            calibration: (&c.calibration).into(),
            actuator: (&c.actuator).into(),
            telemetry: (&c.telemetry).into(),
            display: (&c.display).into(),
            initial_calibration: (&c.calibration).into(),
        }
    }
}

impl RoasterSettings {
    /// Parse, validate and convert a TOML document in one step.
    pub fn from_toml_str(s: &str) -> crate::error::Result<Self> {
        let cfg: roaster_config::Config =
            toml::from_str(s).map_err(|e| eyre::eyre!("parse config: {e}"))?;
        cfg.validate()?;
        Ok((&cfg).into())
    }
}
