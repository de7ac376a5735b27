//! Rate-limited CSV telemetry.
//!
//! One line per emission:
//! `elapsed_roast_ms,elapsed_total_ms,phase,fan_raw,heat_raw,bean_f,intake_f,weight,drop_percent`
//! with an optional tenth column naming faulted channels (`bean|weight`, or `-`).

use std::fmt::Write as _;

use roaster_traits::LineSink;

use crate::config::TelemetryCfg;
use crate::error::RoasterError;
use crate::hw_error::map_sink_error;
use crate::sensors::SensorSnapshot;
use crate::status::RoastStatus;
use crate::util::RateLimiter;

pub const HEADER: &str = "elapsed_roast_ms,elapsed_total_ms,phase,fan_raw,heat_raw,bean_temp_f,intake_temp_f,weight,drop_percent";

/// Format one telemetry line.
pub fn format_line(status: &RoastStatus, snapshot: &SensorSnapshot, include_faults: bool) -> String {
    let mut line = format!(
        "{},{},{},{},{},{:.2},{:.2},{:.2},{:.2}",
        status.elapsed_roast_ms,
        status.elapsed_total_ms,
        status.phase.label(),
        snapshot.fan_raw.value,
        snapshot.heat_raw.value,
        snapshot.bean_temp_f.value,
        snapshot.intake_temp_f.value,
        status.weight_units,
        status.drop_percent,
    );
    if include_faults {
        line.push(',');
        let mut any = false;
        for channel in snapshot.faulted_channels() {
            if any {
                line.push('|');
            }
            let _ = write!(line, "{channel}");
            any = true;
        }
        if !any {
            line.push('-');
        }
    }
    line
}

pub struct TelemetryEmitter {
    sink: Box<dyn LineSink>,
    limiter: RateLimiter,
    include_faults: bool,
    emitted: u64,
}

impl core::fmt::Debug for TelemetryEmitter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TelemetryEmitter")
            .field("interval_ms", &self.limiter.interval_ms())
            .field("include_faults", &self.include_faults)
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}

impl TelemetryEmitter {
    pub fn new(sink: Box<dyn LineSink>, cfg: &TelemetryCfg) -> Self {
        Self {
            sink,
            limiter: RateLimiter::new(cfg.interval_ms),
            include_faults: cfg.include_faults,
            emitted: 0,
        }
    }

    /// Write a line if the interval has elapsed. Returns whether a line was
    /// written; a sink failure still consumes the interval.
    pub fn maybe_emit(
        &mut self,
        now_ms: u64,
        status: &RoastStatus,
        snapshot: &SensorSnapshot,
    ) -> Result<bool, RoasterError> {
        if !self.limiter.fire(now_ms) {
            return Ok(false);
        }
        let line = format_line(status, snapshot, self.include_faults);
        self.sink
            .write_line(&line)
            .map_err(|e| map_sink_error(&*e))?;
        self.emitted += 1;
        Ok(true)
    }

    pub const fn emitted(&self) -> u64 {
        self.emitted
    }
}
