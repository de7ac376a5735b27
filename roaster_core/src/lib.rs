#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core roaster control logic (hardware-agnostic).
//!
//! This crate provides the hardware-independent roast controller. All hardware
//! interactions go through the device traits in `roaster_traits`.
//!
//! ## Architecture
//!
//! - **Acquisition**: rate-limited sensor polling with per-channel faults (`sensors`)
//! - **Actuation**: dial-to-duty mapping for heater and fan (`actuator`)
//! - **State machine**: roast phases, timers and calibration (`machine`)
//! - **Outputs**: CSV telemetry (`telemetry`, `writer`) and display frames (`display`)
//! - **Controller**: the per-tick pipeline and run loop (`runner`)

pub mod actuator;
pub mod button;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod diag;
pub mod display;
pub mod error;
pub mod hw_error;
pub mod machine;
pub mod mocks;
pub mod phase;
pub mod runner;
pub mod sensors;
pub mod status;
pub mod telemetry;
pub mod util;
pub mod writer;

pub use actuator::{ActuatorCommand, ActuatorDriver, DutyMap};
pub use calibration::{Calibration, CalibrationJob, CalibrationKind};
pub use config::RoasterSettings;
pub use error::{BuildError, Channel, RoasterError, SensorError};
pub use machine::{RoastMachine, drop_percent};
pub use phase::RoastPhase;
pub use runner::{Roaster, RoasterBuilder, RunLimits, RunSummary, StopReason};
pub use sensors::{Reading, ScaleControl, SensorAcquisition, SensorSnapshot, WeightChannel};
pub use status::RoastStatus;
