//! Configuration types for the roaster controller.
//!
//! These are the runtime configuration structs used by `Roaster`.
//! They are separate from the TOML-deserialized config in `roaster_config`.

use crate::calibration::Calibration;

/// Sampling cadence for the control loop and each sensor class.
#[derive(Debug, Clone)]
pub struct SamplingCfg {
    /// Control loop period (ms).
    pub tick_ms: u64,
    /// Minimum interval between thermocouple reads (ms).
    pub thermocouple_ms: u64,
    /// Minimum interval between load-cell reads (ms).
    pub load_cell_ms: u64,
    /// Max wait per load-cell read (ms).
    pub read_timeout_ms: u64,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            thermocouple_ms: 250,
            load_cell_ms: 100,
            read_timeout_ms: 150,
        }
    }
}

/// Thresholds for the automatic phase transitions.
#[derive(Debug, Clone)]
pub struct PhaseThresholds {
    /// Preheat -> Tare once intake >= this (°F).
    pub preheat_temp_f: f32,
    /// Roast -> Drop once the heat dial is at or below this percentage.
    pub drop_heat_percent: u8,
    /// Drop -> Done once beans are below this (°F).
    pub done_bean_temp_f: f32,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            preheat_temp_f: 325.0,
            drop_heat_percent: 5,
            done_bean_temp_f: 150.0,
        }
    }
}

/// Band of temperatures accepted from a thermocouple.
#[derive(Debug, Clone, Copy)]
pub struct PlausibleRange {
    pub min_f: f32,
    pub max_f: f32,
}

impl PlausibleRange {
    pub fn contains(&self, t: f32) -> bool {
        t.is_finite() && t >= self.min_f && t <= self.max_f
    }
}

impl Default for PlausibleRange {
    fn default() -> Self {
        Self {
            min_f: -40.0,
            max_f: 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoastCfg {
    /// Green charge weight in scale units.
    pub target_charge_units: f32,
    /// Load -> Calibrate once more than half the charge is on the scale.
    pub auto_load_advance: bool,
}

impl Default for RoastCfg {
    fn default() -> Self {
        Self {
            target_charge_units: 100.0,
            auto_load_advance: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationMode {
    #[default]
    Blocking,
    Sampled,
}

/// What the actuators do while a sampled calibration is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActuatorPolicy {
    #[default]
    Hold,
    Zero,
}

#[derive(Debug, Clone)]
pub struct CalibrationCfg {
    pub mode: CalibrationMode,
    /// Samples averaged per tare/calibrate.
    pub samples: u32,
    /// Overall bound on one tare/calibrate (ms).
    pub timeout_ms: u64,
    pub actuator: ActuatorPolicy,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            mode: CalibrationMode::Blocking,
            samples: 10,
            timeout_ms: 5_000,
            actuator: ActuatorPolicy::Hold,
        }
    }
}

/// ADC and PWM resolutions.
#[derive(Debug, Clone)]
pub struct ActuatorCfg {
    pub adc_bits: u8,
    pub duty_bits: u8,
}

impl Default for ActuatorCfg {
    fn default() -> Self {
        Self {
            adc_bits: 12,
            duty_bits: 12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryCfg {
    pub interval_ms: u64,
    pub include_faults: bool,
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self {
            interval_ms: 250,
            include_faults: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisplayCfg {
    pub fps: u32,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

/// Everything the controller needs besides its devices.
#[derive(Debug, Clone, Default)]
pub struct RoasterSettings {
    pub sampling: SamplingCfg,
    pub thresholds: PhaseThresholds,
    pub plausible: PlausibleRange,
    pub roast: RoastCfg,
    pub calibration: CalibrationCfg,
    pub actuator: ActuatorCfg,
    pub telemetry: TelemetryCfg,
    pub display: DisplayCfg,
    /// Scale calibration in effect until the first tare/calibrate.
    pub initial_calibration: Calibration,
}
