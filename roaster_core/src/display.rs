//! Hand-off of status frames to an external display, capped at the
//! configured frame rate. Layout is the display's business.

use roaster_traits::BoxError;

use crate::actuator::ActuatorCommand;
use crate::config::DisplayCfg;
use crate::error::RoasterError;
use crate::hw_error::map_sink_error;
use crate::phase::RoastPhase;
use crate::sensors::SensorSnapshot;
use crate::status::RoastStatus;
use crate::util::{RateLimiter, period_ms};

/// Everything a display might show for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub phase: RoastPhase,
    pub elapsed_roast_ms: u64,
    pub elapsed_total_ms: u64,
    pub bean_temp_f: f32,
    pub intake_temp_f: f32,
    pub weight_units: f32,
    pub drop_percent: f32,
    pub heat_percent: u8,
    pub fan_percent: u8,
    /// Dial positions in hundredths of a mark.
    pub heat_dial: u32,
    pub fan_dial: u32,
    pub calibrating: bool,
    pub fault: Option<String>,
}

impl DisplayFrame {
    pub fn new(status: &RoastStatus, snapshot: &SensorSnapshot, command: &ActuatorCommand) -> Self {
        Self {
            phase: status.phase,
            elapsed_roast_ms: status.elapsed_roast_ms,
            elapsed_total_ms: status.elapsed_total_ms,
            bean_temp_f: snapshot.bean_temp_f.value,
            intake_temp_f: snapshot.intake_temp_f.value,
            weight_units: status.weight_units,
            drop_percent: status.drop_percent,
            heat_percent: command.heat_percent,
            fan_percent: command.fan_percent,
            heat_dial: command.heat_dial,
            fan_dial: command.fan_dial,
            calibrating: status.is_calibrating(),
            fault: status.fault.as_ref().map(ToString::to_string),
        }
    }
}

/// External display collaborator.
pub trait StatusDisplay {
    fn render(&mut self, frame: &DisplayFrame) -> Result<(), BoxError>;
}

/// Headless display: frames go to the `trace` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceDisplay;

impl StatusDisplay for TraceDisplay {
    fn render(&mut self, frame: &DisplayFrame) -> Result<(), BoxError> {
        tracing::trace!(
            phase = %frame.phase,
            bean_f = frame.bean_temp_f,
            intake_f = frame.intake_temp_f,
            heat_pct = frame.heat_percent,
            fan_pct = frame.fan_percent,
            "frame"
        );
        Ok(())
    }
}

pub struct DisplayRenderer {
    display: Box<dyn StatusDisplay>,
    limiter: RateLimiter,
    frames: u64,
}

impl core::fmt::Debug for DisplayRenderer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DisplayRenderer")
            .field("interval_ms", &self.limiter.interval_ms())
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl DisplayRenderer {
    pub fn new(display: Box<dyn StatusDisplay>, cfg: &DisplayCfg) -> Self {
        Self {
            display,
            limiter: RateLimiter::new(period_ms(cfg.fps)),
            frames: 0,
        }
    }

    /// Render if at least one frame period has elapsed. Returns whether a
    /// frame was handed over.
    pub fn maybe_render(
        &mut self,
        now_ms: u64,
        status: &RoastStatus,
        snapshot: &SensorSnapshot,
        command: &ActuatorCommand,
    ) -> Result<bool, RoasterError> {
        if !self.limiter.fire(now_ms) {
            return Ok(false);
        }
        let frame = DisplayFrame::new(status, snapshot, command);
        self.display
            .render(&frame)
            .map_err(|e| map_sink_error(&*e))?;
        self.frames += 1;
        Ok(true)
    }

    pub const fn frames(&self) -> u64 {
        self.frames
    }
}
