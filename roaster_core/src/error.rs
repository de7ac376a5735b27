use std::fmt;

use thiserror::Error;

/// Failure of one sensor read. Kept per channel in the snapshot.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("implausible reading: {0}")]
    Implausible(f32),
}

/// Sensor channels sampled by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    FanDial,
    HeatDial,
    BeanTemp,
    IntakeTemp,
    Weight,
}

impl Channel {
    pub const ALL: [Self; 5] = [
        Self::FanDial,
        Self::HeatDial,
        Self::BeanTemp,
        Self::IntakeTemp,
        Self::Weight,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FanDial => "fan",
            Self::HeatDial => "heat",
            Self::BeanTemp => "bean",
            Self::IntakeTemp => "intake",
            Self::Weight => "weight",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoasterError {
    #[error("{channel} sensor: {source}")]
    Sensor {
        channel: Channel,
        source: SensorError,
    },
    #[error("actuator error: {0}")]
    Actuator(String),
    #[error("calibration timed out")]
    CalibrationTimeout,
    #[error("calibration failed: {0}")]
    Calibration(String),
    #[error("line sink error: {0}")]
    Sink(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing dial")]
    MissingDial,
    #[error("missing thermocouple")]
    MissingThermocouple,
    #[error("missing load cell")]
    MissingLoadCell,
    #[error("missing pwm output")]
    MissingPwm,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
