//! Maps `Box<dyn Error>` from trait boundaries to typed errors.
//!
//! The traits in `roaster_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enums, with an
//! optional feature-gated path for `roaster_hardware::HwError` downcasting.

use crate::error::{RoasterError, SensorError};

/// Map a sensor read failure to a typed `SensorError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_sensor_error(e: &(dyn std::error::Error + 'static)) -> SensorError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<roaster_hardware::HwError>() {
            return match hw {
                roaster_hardware::HwError::Timeout | roaster_hardware::HwError::DataReadyTimeout => {
                    SensorError::Timeout
                }
                other => SensorError::Hardware(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        SensorError::Timeout
    } else {
        SensorError::Hardware(s)
    }
}

/// Map a PWM write failure to `RoasterError::Actuator`.
pub fn map_actuator_error(e: &(dyn std::error::Error + 'static)) -> RoasterError {
    RoasterError::Actuator(e.to_string())
}

/// Map a line/display sink failure to `RoasterError::Sink`.
pub fn map_sink_error(e: &(dyn std::error::Error + 'static)) -> RoasterError {
    RoasterError::Sink(e.to_string())
}
