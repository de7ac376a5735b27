//! The roaster controller: owns every device and runs the per-tick pipeline
//! acquisition -> actuation -> state machine -> telemetry/display.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;
use roaster_traits::{
    Clock, Dial, LineSink, LoadCell, MonotonicClock, PressCounter, PwmOutput, Thermocouple,
};

use crate::actuator::{ActuatorCommand, ActuatorDriver};
use crate::button::AdvanceButton;
use crate::calibration::Calibration;
use crate::config::{ActuatorPolicy, RoasterSettings};
use crate::diag::{self, DiagInputs, DiagMode};
use crate::display::{DisplayRenderer, StatusDisplay};
use crate::error::{BuildError, Channel, Result, SensorError};
use crate::machine::RoastMachine;
use crate::phase::RoastPhase;
use crate::sensors::{ScaleControl, SensorAcquisition, SensorDevices, SensorSnapshot};
use crate::status::RoastStatus;
use crate::telemetry::TelemetryEmitter;

/// When `Roaster::run` should return on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLimits {
    pub max_ticks: Option<u64>,
    pub duration_ms: Option<u64>,
    /// Return once the machine reaches `Done`.
    pub stop_at_done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    MaxTicks,
    Duration,
    Done,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reason: StopReason,
    pub ticks: u64,
    pub elapsed_ms: u64,
    pub status: RoastStatus,
}

pub struct Roaster {
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    settings: RoasterSettings,
    sensors: SensorAcquisition,
    actuators: ActuatorDriver,
    machine: RoastMachine,
    telemetry: Option<TelemetryEmitter>,
    display: Option<DisplayRenderer>,
    button: Option<AdvanceButton>,
    pending_advance: bool,
    last_status: RoastStatus,
    last_command: ActuatorCommand,
    ticks: u64,
}

impl core::fmt::Debug for Roaster {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Roaster")
            .field("phase", &self.last_status.phase)
            .field("ticks", &self.ticks)
            .field("machine", &self.machine)
            .finish_non_exhaustive()
    }
}

impl Roaster {
    /// Start building a Roaster.
    pub fn builder() -> RoasterBuilder {
        RoasterBuilder::default()
    }

    /// Milliseconds since the controller was built.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Advance one phase on the next tick, as if the button had been pressed.
    pub fn request_advance(&mut self) {
        self.pending_advance = true;
    }

    /// One pass of the control loop.
    pub fn tick(&mut self) -> Result<RoastStatus> {
        let now_ms = self.now_ms();
        let pressed = self.button.as_mut().is_some_and(AdvanceButton::poll);
        let advance = std::mem::take(&mut self.pending_advance) || pressed;

        let snapshot = self.sensors.sample(now_ms).clone();

        let command = self.actuators.command(&snapshot);
        let hold_zero = self.machine.is_calibrating()
            && self.settings.calibration.actuator == ActuatorPolicy::Zero;
        let applied = if hold_zero {
            self.actuators.apply(&command.zeroed())
        } else {
            self.actuators.apply(&command)
        };
        applied
            .map_err(eyre::Report::new)
            .wrap_err("driving actuators")?;

        let status = self.machine.step(
            now_ms,
            &snapshot,
            &command,
            advance,
            self.sensors.scale_mut(),
        );

        if let Some(t) = self.telemetry.as_mut()
            && let Err(e) = t.maybe_emit(now_ms, &status, &snapshot)
        {
            tracing::warn!(error = %e, "telemetry sink failed");
        }
        if let Some(d) = self.display.as_mut()
            && let Err(e) = d.maybe_render(now_ms, &status, &snapshot, &command)
        {
            tracing::warn!(error = %e, "display sink failed");
        }

        self.last_command = command;
        self.last_status = status.clone();
        self.ticks += 1;
        Ok(status)
    }

    /// Tick every `sampling.tick_ms` until `shutdown` is set or a limit is hit.
    /// Outputs are driven to zero on the way out.
    pub fn run(&mut self, shutdown: &AtomicBool, limits: RunLimits) -> Result<RunSummary> {
        let tick = Duration::from_millis(self.settings.sampling.tick_ms);
        let start_ms = self.now_ms();
        let start_ticks = self.ticks;
        tracing::info!(tick_ms = self.settings.sampling.tick_ms, "roast loop start");

        let result = loop {
            if shutdown.load(Ordering::Relaxed) {
                break Ok(StopReason::Shutdown);
            }
            if limits
                .max_ticks
                .is_some_and(|max| self.ticks - start_ticks >= max)
            {
                break Ok(StopReason::MaxTicks);
            }
            if limits
                .duration_ms
                .is_some_and(|d| self.now_ms().saturating_sub(start_ms) >= d)
            {
                break Ok(StopReason::Duration);
            }

            let tick_start = self.clock.now();
            match self.tick() {
                Ok(status) => {
                    if limits.stop_at_done && status.phase == RoastPhase::Done {
                        break Ok(StopReason::Done);
                    }
                }
                Err(e) => break Err(e),
            }
            let spent = self.clock.now().saturating_duration_since(tick_start);
            if spent < tick {
                self.clock.sleep(tick - spent);
            }
        };

        if let Err(e) = self.stop_outputs() {
            tracing::warn!(error = %e, "failed to zero outputs on exit");
        }

        let reason = result?;
        let summary = RunSummary {
            reason,
            ticks: self.ticks - start_ticks,
            elapsed_ms: self.now_ms().saturating_sub(start_ms),
            status: self.last_status.clone(),
        };
        tracing::info!(
            reason = ?summary.reason,
            ticks = summary.ticks,
            phase = %summary.status.phase,
            "roast loop stop"
        );
        Ok(summary)
    }

    /// Drive heater and fan to zero.
    pub fn stop_outputs(&mut self) -> Result<()> {
        self.actuators
            .force_zero()
            .map_err(eyre::Report::new)
            .wrap_err("zeroing outputs")
    }

    /// One acquisition pass; reports each channel's fault, if any.
    pub fn self_check(&mut self) -> Vec<(Channel, Option<SensorError>)> {
        let now_ms = self.now_ms();
        let snapshot = self.sensors.sample(now_ms);
        Channel::ALL
            .into_iter()
            .map(|c| (c, snapshot.fault(c).cloned()))
            .collect()
    }

    /// Sample once and render the diagnostic screen for `mode`.
    pub fn diag_frame(&mut self, mode: DiagMode) -> Vec<String> {
        let now_ms = self.now_ms();
        let presses = self.button.as_mut().map_or(0, AdvanceButton::count);
        let snapshot = self.sensors.sample(now_ms);
        let command = self.actuators.command(snapshot);
        diag::frame(
            mode,
            &DiagInputs {
                snapshot,
                command: &command,
                map: self.actuators.map(),
                presses,
            },
        )
    }

    pub const fn status(&self) -> &RoastStatus {
        &self.last_status
    }

    pub const fn phase(&self) -> RoastPhase {
        self.machine.phase()
    }

    pub const fn snapshot(&self) -> &SensorSnapshot {
        self.sensors.snapshot()
    }

    pub const fn command(&self) -> &ActuatorCommand {
        &self.last_command
    }

    pub fn calibration(&self) -> Calibration {
        self.sensors.scale().calibration()
    }

    pub const fn settings(&self) -> &RoasterSettings {
        &self.settings
    }

    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn phase_elapsed_ms(&self) -> u64 {
        self.machine.phase_elapsed_ms(self.now_ms())
    }
}

/// Builder for `Roaster`. All devices are required except the button, the
/// telemetry sink and the display.
#[derive(Default)]
pub struct RoasterBuilder {
    fan_dial: Option<Box<dyn Dial>>,
    heat_dial: Option<Box<dyn Dial>>,
    bean: Option<Box<dyn Thermocouple>>,
    intake: Option<Box<dyn Thermocouple>>,
    load_cell: Option<Box<dyn LoadCell>>,
    heater: Option<Box<dyn PwmOutput>>,
    fan: Option<Box<dyn PwmOutput>>,
    button: Option<Box<dyn PressCounter>>,
    telemetry: Option<Box<dyn LineSink>>,
    display: Option<Box<dyn StatusDisplay>>,
    settings: Option<RoasterSettings>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn validate_settings(s: &RoasterSettings) -> Result<()> {
    if s.sampling.tick_ms == 0 {
        return Err(invalid("tick_ms must be >= 1"));
    }
    if s.sampling.thermocouple_ms == 0 || s.sampling.load_cell_ms == 0 {
        return Err(invalid("sensor intervals must be >= 1"));
    }
    if s.telemetry.interval_ms == 0 {
        return Err(invalid("telemetry interval must be >= 1"));
    }
    if s.display.fps == 0 {
        return Err(invalid("display fps must be > 0"));
    }
    if !(s.roast.target_charge_units.is_finite() && s.roast.target_charge_units > 0.0) {
        return Err(invalid("target charge must be > 0"));
    }
    if s.thresholds.drop_heat_percent > 100 {
        return Err(invalid("drop heat percent must be <= 100"));
    }
    if !s.thresholds.preheat_temp_f.is_finite() || !s.thresholds.done_bean_temp_f.is_finite() {
        return Err(invalid("phase temperatures must be finite"));
    }
    if s.plausible.min_f.partial_cmp(&s.plausible.max_f) != Some(std::cmp::Ordering::Less) {
        return Err(invalid("plausible range is empty"));
    }
    if s.calibration.samples == 0 {
        return Err(invalid("calibration samples must be >= 1"));
    }
    let gain = s.initial_calibration.gain_units_per_count;
    if !gain.is_finite() || gain == 0.0 {
        return Err(invalid("calibration gain must be finite and non-zero"));
    }
    Ok(())
}

impl RoasterBuilder {
    pub fn with_dials(mut self, fan: impl Dial + 'static, heat: impl Dial + 'static) -> Self {
        self.fan_dial = Some(Box::new(fan));
        self.heat_dial = Some(Box::new(heat));
        self
    }
    pub fn with_thermocouples(
        mut self,
        bean: impl Thermocouple + 'static,
        intake: impl Thermocouple + 'static,
    ) -> Self {
        self.bean = Some(Box::new(bean));
        self.intake = Some(Box::new(intake));
        self
    }
    pub fn with_load_cell(mut self, cell: impl LoadCell + 'static) -> Self {
        self.load_cell = Some(Box::new(cell));
        self
    }
    pub fn with_outputs(
        mut self,
        heater: impl PwmOutput + 'static,
        fan: impl PwmOutput + 'static,
    ) -> Self {
        self.heater = Some(Box::new(heater));
        self.fan = Some(Box::new(fan));
        self
    }
    pub fn with_button(mut self, counter: impl PressCounter + 'static) -> Self {
        self.button = Some(Box::new(counter));
        self
    }
    pub fn with_telemetry(mut self, sink: impl LineSink + 'static) -> Self {
        self.telemetry = Some(Box::new(sink));
        self
    }
    pub fn with_display(mut self, display: impl StatusDisplay + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }
    pub fn with_settings(mut self, settings: RoasterSettings) -> Self {
        self.settings = Some(settings);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Fallible build; returns a typed `BuildError` for missing pieces.
    pub fn try_build(self) -> Result<Roaster> {
        let missing = |e: BuildError| eyre::Report::new(e);
        let fan_dial = self.fan_dial.ok_or_else(|| missing(BuildError::MissingDial))?;
        let heat_dial = self.heat_dial.ok_or_else(|| missing(BuildError::MissingDial))?;
        let bean = self
            .bean
            .ok_or_else(|| missing(BuildError::MissingThermocouple))?;
        let intake = self
            .intake
            .ok_or_else(|| missing(BuildError::MissingThermocouple))?;
        let load_cell = self
            .load_cell
            .ok_or_else(|| missing(BuildError::MissingLoadCell))?;
        let heater = self.heater.ok_or_else(|| missing(BuildError::MissingPwm))?;
        let fan = self.fan.ok_or_else(|| missing(BuildError::MissingPwm))?;

        let settings = self.settings.unwrap_or_default();
        validate_settings(&settings)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };
        let epoch = clock.now();

        let sensors = SensorAcquisition::new(
            SensorDevices {
                fan_dial,
                heat_dial,
                bean,
                intake,
                load_cell,
            },
            &settings,
            clock.clone(),
        );
        let actuators = ActuatorDriver::new(heater, fan, &settings.actuator);
        let machine = RoastMachine::new(&settings);
        let telemetry = self
            .telemetry
            .map(|sink| TelemetryEmitter::new(sink, &settings.telemetry));
        let display = self
            .display
            .map(|d| DisplayRenderer::new(d, &settings.display));
        let button = self.button.map(AdvanceButton::new);

        Ok(Roaster {
            clock,
            epoch,
            settings,
            sensors,
            actuators,
            machine,
            telemetry,
            display,
            button,
            pending_advance: false,
            last_status: RoastStatus::default(),
            last_command: ActuatorCommand::default(),
            ticks: 0,
        })
    }
}

impl core::fmt::Debug for RoasterBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RoasterBuilder")
            .field("settings", &self.settings)
            .field("has_button", &self.button.is_some())
            .field("has_telemetry", &self.telemetry.is_some())
            .finish_non_exhaustive()
    }
}
