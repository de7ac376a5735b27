//! Linear load-cell model and the sample accumulator used by sampled
//! calibration.

use crate::error::RoasterError;

/// `units = gain_units_per_count * (raw - zero_counts) + offset_units`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub gain_units_per_count: f32,
    pub zero_counts: i32,
    pub offset_units: f32,
}

impl Calibration {
    pub fn to_units(&self, raw: i32) -> f32 {
        self.gain_units_per_count * (raw.saturating_sub(self.zero_counts) as f32)
            + self.offset_units
    }

    /// Gain that maps `loaded_counts` to `known_units` given the current zero
    /// and offset.
    pub fn span_gain(&self, known_units: f32, loaded_counts: i32) -> Result<f32, RoasterError> {
        let delta = loaded_counts.saturating_sub(self.zero_counts);
        if delta == 0 {
            return Err(RoasterError::Calibration(
                "no load change since tare".into(),
            ));
        }
        let gain = (known_units - self.offset_units) / delta as f32;
        if !gain.is_finite() || gain == 0.0 {
            return Err(RoasterError::Calibration(format!(
                "degenerate gain {gain} for {known_units} units over {delta} counts"
            )));
        }
        Ok(gain)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            gain_units_per_count: 0.01, // 1 count = 0.01 g, matches sim
            zero_counts: 0,
            offset_units: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationKind {
    Tare,
    /// Span calibration against a known load.
    Span { known_units: f32 },
}

/// In-progress sampled calibration: averages fresh load-cell reads taken at
/// the normal cadence until enough have arrived or the deadline passes.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationJob {
    pub kind: CalibrationKind,
    pub started_ms: u64,
    pub samples_needed: u32,
    pub timeout_ms: u64,
    sum: i64,
    collected: u32,
}

impl CalibrationJob {
    pub fn new(kind: CalibrationKind, started_ms: u64, samples_needed: u32, timeout_ms: u64) -> Self {
        Self {
            kind,
            started_ms,
            samples_needed: samples_needed.max(1),
            timeout_ms,
            sum: 0,
            collected: 0,
        }
    }

    pub fn push(&mut self, raw: i32) {
        if self.is_complete() {
            return;
        }
        self.sum += i64::from(raw);
        self.collected += 1;
    }

    pub const fn collected(&self) -> u32 {
        self.collected
    }

    pub const fn is_complete(&self) -> bool {
        self.collected >= self.samples_needed
    }

    pub const fn timed_out(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_ms) >= self.timeout_ms
    }

    /// Mean of the collected samples, rounded to nearest.
    pub fn mean_counts(&self) -> Option<i32> {
        if self.collected == 0 {
            return None;
        }
        let mean = (self.sum as f64 / f64::from(self.collected)).round();
        Some(mean.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
    }
}
