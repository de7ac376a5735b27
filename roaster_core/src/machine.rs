//! Roast-phase state machine.
//!
//! One call to [`RoastMachine::step`] per tick. Automatic transitions react to
//! thresholds on the snapshot and the actuator command; a manual advance
//! overrides them for that tick and moves exactly one phase forward,
//! wrapping `Done -> Ready`.

use crate::actuator::ActuatorCommand;
use crate::calibration::{CalibrationJob, CalibrationKind};
use crate::config::{CalibrationCfg, CalibrationMode, PhaseThresholds, RoastCfg, RoasterSettings};
use crate::error::RoasterError;
use crate::phase::RoastPhase;
use crate::sensors::{ScaleControl, SensorSnapshot};
use crate::status::RoastStatus;

/// Percentage of the charge lost: `100 * (target - weight) / target`.
///
/// Negative when the scale reads above the charge; 0 for a non-positive target.
pub fn drop_percent(target_units: f32, weight_units: f32) -> f32 {
    if target_units > 0.0 {
        100.0 * (target_units - weight_units) / target_units
    } else {
        0.0
    }
}

#[derive(Debug)]
pub struct RoastMachine {
    thresholds: PhaseThresholds,
    roast: RoastCfg,
    calibration: CalibrationCfg,
    phase: RoastPhase,
    phase_start_ms: u64,
    session_start_ms: Option<u64>,
    roast_start_ms: Option<u64>,
    elapsed_roast_ms: u64,
    drop_percent: f32,
    weight_units: f32,
    job: Option<CalibrationJob>,
    fault: Option<RoasterError>,
}

impl RoastMachine {
    pub fn new(settings: &RoasterSettings) -> Self {
        Self {
            thresholds: settings.thresholds.clone(),
            roast: settings.roast.clone(),
            calibration: settings.calibration.clone(),
            phase: RoastPhase::Ready,
            phase_start_ms: 0,
            session_start_ms: None,
            roast_start_ms: None,
            elapsed_roast_ms: 0,
            drop_percent: 0.0,
            weight_units: 0.0,
            job: None,
            fault: None,
        }
    }

    pub const fn phase(&self) -> RoastPhase {
        self.phase
    }

    pub const fn is_calibrating(&self) -> bool {
        self.job.is_some()
    }

    pub fn phase_elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.phase_start_ms)
    }

    pub fn elapsed_total_ms(&self, now_ms: u64) -> u64 {
        self.session_start_ms
            .map_or(0, |start| now_ms.saturating_sub(start))
    }

    /// Advance one tick.
    pub fn step(
        &mut self,
        now_ms: u64,
        snapshot: &SensorSnapshot,
        command: &ActuatorCommand,
        advance: bool,
        scale: &mut dyn ScaleControl,
    ) -> RoastStatus {
        if snapshot.raw_weight.has_value() {
            self.weight_units = snapshot.weight_units;
        }
        if self.session_start_ms.is_none() {
            self.session_start_ms = Some(now_ms);
            tracing::info!(now_ms, "session started");
        }

        if advance {
            if let Some(job) = self.job.take() {
                tracing::warn!(
                    kind = ?job.kind,
                    collected = job.collected(),
                    "calibration abandoned by manual advance"
                );
            }
            let next = self.phase.next();
            tracing::info!(from = %self.phase, to = %next, "manual advance");
            self.enter(next, now_ms);
        } else {
            self.run_automatic(now_ms, snapshot, command, scale);
        }

        self.status(now_ms)
    }

    fn run_automatic(
        &mut self,
        now_ms: u64,
        snapshot: &SensorSnapshot,
        command: &ActuatorCommand,
        scale: &mut dyn ScaleControl,
    ) {
        match self.phase {
            RoastPhase::Ready => self.transition(RoastPhase::Preheat, now_ms),
            RoastPhase::Preheat => {
                if snapshot
                    .intake_temp_f
                    .get()
                    .is_some_and(|t| t >= self.thresholds.preheat_temp_f)
                {
                    self.transition(RoastPhase::Tare, now_ms);
                }
            }
            RoastPhase::Tare => {
                if self.calibrate_step(now_ms, snapshot, CalibrationKind::Tare, scale) {
                    self.transition(RoastPhase::Load, now_ms);
                }
            }
            RoastPhase::Load => {
                let half_charge = self.roast.target_charge_units / 2.0;
                if self.roast.auto_load_advance
                    && snapshot.raw_weight.usable()
                    && snapshot.weight_units > half_charge
                {
                    self.transition(RoastPhase::Calibrate, now_ms);
                }
            }
            RoastPhase::Calibrate => {
                let kind = CalibrationKind::Span {
                    known_units: self.roast.target_charge_units,
                };
                if self.calibrate_step(now_ms, snapshot, kind, scale) {
                    self.transition(RoastPhase::Roast, now_ms);
                }
            }
            RoastPhase::Roast => {
                self.track_roast(now_ms);
                if snapshot.heat_raw.usable()
                    && command.heat_percent <= self.thresholds.drop_heat_percent
                {
                    self.transition(RoastPhase::Drop, now_ms);
                }
            }
            RoastPhase::Drop => {
                if snapshot
                    .bean_temp_f
                    .get()
                    .is_some_and(|t| t < self.thresholds.done_bean_temp_f)
                {
                    self.transition(RoastPhase::Done, now_ms);
                }
            }
            RoastPhase::Done => {}
        }
    }

    /// Run one tick of tare/span calibration. Returns true once the phase
    /// may advance, whether the calibration succeeded or not.
    fn calibrate_step(
        &mut self,
        now_ms: u64,
        snapshot: &SensorSnapshot,
        kind: CalibrationKind,
        scale: &mut dyn ScaleControl,
    ) -> bool {
        match self.calibration.mode {
            CalibrationMode::Blocking => {
                self.fault = None;
                let res = match kind {
                    CalibrationKind::Tare => scale.tare().map(|zero| {
                        tracing::info!(zero_counts = zero, "tare complete");
                    }),
                    CalibrationKind::Span { known_units } => {
                        scale.calibrate(known_units).map(|gain| {
                            tracing::info!(known_units, gain, "calibration complete");
                        })
                    }
                };
                if let Err(e) = res {
                    tracing::warn!(error = %e, "calibration failed; keeping previous calibration");
                    self.fault = Some(e);
                }
                true
            }
            CalibrationMode::Sampled => self.sampled_step(now_ms, snapshot, kind, scale),
        }
    }

    fn sampled_step(
        &mut self,
        now_ms: u64,
        snapshot: &SensorSnapshot,
        kind: CalibrationKind,
        scale: &mut dyn ScaleControl,
    ) -> bool {
        if self.job.is_none() {
            let (samples, timeout_ms) = (self.calibration.samples, self.calibration.timeout_ms);
            tracing::info!(?kind, samples, "calibration started");
            self.fault = None;
            self.job = Some(CalibrationJob::new(kind, now_ms, samples, timeout_ms));
        }
        let Some(job) = self.job.as_mut() else {
            return true;
        };

        if snapshot.raw_weight.refreshed
            && let Some(raw) = snapshot.raw_weight.get()
        {
            job.push(raw);
        }

        if job.is_complete() {
            let mean = job.mean_counts();
            self.job = None;
            if let Some(mean) = mean {
                self.apply_sampled(kind, mean, scale);
            }
            return true;
        }

        if job.timed_out(now_ms) {
            tracing::warn!(
                collected = job.collected(),
                needed = job.samples_needed,
                "calibration timed out; keeping previous calibration"
            );
            self.job = None;
            self.fault = Some(RoasterError::CalibrationTimeout);
            return true;
        }

        false
    }

    fn apply_sampled(&mut self, kind: CalibrationKind, mean: i32, scale: &mut dyn ScaleControl) {
        match kind {
            CalibrationKind::Tare => {
                scale.set_zero_counts(mean);
                tracing::info!(zero_counts = mean, "tare complete");
            }
            CalibrationKind::Span { known_units } => {
                match scale.calibration().span_gain(known_units, mean) {
                    Ok(gain) => {
                        scale.set_gain(gain);
                        tracing::info!(known_units, gain, "calibration complete");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "calibration failed; keeping previous calibration");
                        self.fault = Some(e);
                    }
                }
            }
        }
    }

    fn transition(&mut self, next: RoastPhase, now_ms: u64) {
        tracing::info!(from = %self.phase, to = %next, now_ms, "phase transition");
        self.enter(next, now_ms);
    }

    /// Phase-entry bookkeeping; runs for automatic and manual transitions alike.
    fn enter(&mut self, next: RoastPhase, now_ms: u64) {
        self.phase = next;
        self.phase_start_ms = now_ms;
        match next {
            RoastPhase::Ready => {
                self.session_start_ms = Some(now_ms);
                self.roast_start_ms = None;
                self.elapsed_roast_ms = 0;
                self.drop_percent = 0.0;
                self.fault = None;
                tracing::info!(now_ms, "session started");
            }
            RoastPhase::Calibrate | RoastPhase::Roast if self.roast_start_ms.is_none() => {
                self.roast_start_ms = Some(now_ms);
                self.elapsed_roast_ms = 0;
            }
            _ => {}
        }
        if next == RoastPhase::Roast {
            self.track_roast(now_ms);
        }
    }

    /// Roast timer and drop percent; only called while roasting, so both
    /// freeze once the roast is dropped.
    fn track_roast(&mut self, now_ms: u64) {
        if let Some(start) = self.roast_start_ms {
            self.elapsed_roast_ms = now_ms.saturating_sub(start);
        }
        self.drop_percent = drop_percent(self.roast.target_charge_units, self.weight_units);
    }

    fn status(&self, now_ms: u64) -> RoastStatus {
        RoastStatus {
            phase: self.phase,
            elapsed_roast_ms: self.elapsed_roast_ms,
            elapsed_total_ms: self.elapsed_total_ms(now_ms),
            drop_percent: self.drop_percent,
            weight_units: self.weight_units,
            calibrating: self.job.clone(),
            fault: self.fault.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_percent_reference_values() {
        assert!((drop_percent(90.1, 45.05) - 50.0).abs() < 1e-4);
        assert_eq!(drop_percent(100.0, 100.0), 0.0);
        assert!(drop_percent(100.0, 110.0) < 0.0);
        assert_eq!(drop_percent(0.0, 10.0), 0.0);
    }

    #[test]
    fn timers_read_zero_before_first_ready_tick() {
        let m = RoastMachine::new(&RoasterSettings::default());
        assert_eq!(m.elapsed_total_ms(5_000), 0);
        assert_eq!(m.phase(), RoastPhase::Ready);
    }
}
