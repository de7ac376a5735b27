//! Roast status returned from each control loop iteration.

use crate::calibration::CalibrationJob;
use crate::error::RoasterError;
use crate::phase::RoastPhase;

/// Public status of a single step of the roast state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoastStatus {
    pub phase: RoastPhase,
    /// Time since Calibrate started the roast timer; frozen outside Roast.
    pub elapsed_roast_ms: u64,
    /// Time since Ready started the session timer.
    pub elapsed_total_ms: u64,
    /// Weight lost relative to the charge, in percent. Updated during Roast.
    pub drop_percent: f32,
    pub weight_units: f32,
    /// Sampled calibration in progress, if any.
    pub calibrating: Option<CalibrationJob>,
    /// Last calibration failure.
    pub fault: Option<RoasterError>,
}

impl RoastStatus {
    pub const fn is_calibrating(&self) -> bool {
        self.calibrating.is_some()
    }
}
