//! Test and helper mocks for roaster_core.
//!
//! Every mock is a cheap-to-clone handle: keep one clone in the test to
//! steer or inspect the device while the controller owns the other.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use roaster_traits::{BoxError, Dial, LineSink, LoadCell, PressCounter, PwmOutput, Thermocouple};

use crate::display::{DisplayFrame, StatusDisplay};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Default)]
pub struct SharedDial {
    raw: Arc<AtomicU32>,
    fail: Arc<AtomicBool>,
}

impl SharedDial {
    pub fn set(&self, raw: u16) {
        self.raw.store(u32::from(raw), Ordering::Relaxed);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

impl Dial for SharedDial {
    fn read_raw(&mut self) -> Result<u16, BoxError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err("adc fault".into());
        }
        Ok(u16::try_from(self.raw.load(Ordering::Relaxed)).unwrap_or(u16::MAX))
    }
}

/// Thermocouple returning whatever was last set, counting reads.
#[derive(Debug, Clone)]
pub struct SharedThermocouple {
    value: Arc<Mutex<Result<f32, String>>>,
    reads: Arc<AtomicU64>,
}

impl SharedThermocouple {
    pub fn new(f: f32) -> Self {
        Self {
            value: Arc::new(Mutex::new(Ok(f))),
            reads: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set(&self, f: f32) {
        *lock(&self.value) = Ok(f);
    }

    pub fn fail(&self, msg: &str) {
        *lock(&self.value) = Err(msg.to_owned());
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl Default for SharedThermocouple {
    fn default() -> Self {
        Self::new(70.0)
    }
}

impl Thermocouple for SharedThermocouple {
    fn read_fahrenheit(&mut self) -> Result<f32, BoxError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        lock(&self.value).clone().map_err(Into::into)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedLoadCell {
    raw: Arc<AtomicI32>,
    fail: Arc<AtomicBool>,
    reads: Arc<AtomicU64>,
}

impl SharedLoadCell {
    pub fn set_raw(&self, raw: i32) {
        self.raw.store(raw, Ordering::Relaxed);
    }

    /// Failing reads report a timeout.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl LoadCell for SharedLoadCell {
    fn read(&mut self, _timeout: Duration) -> Result<i32, BoxError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if self.fail.load(Ordering::Relaxed) {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "load cell timeout",
            )));
        }
        Ok(self.raw.load(Ordering::Relaxed))
    }
}

/// PWM output recording every duty written.
#[derive(Debug, Clone, Default)]
pub struct RecordingPwm {
    duties: Arc<Mutex<Vec<u32>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingPwm {
    pub fn last(&self) -> Option<u32> {
        lock(&self.duties).last().copied()
    }

    pub fn writes(&self) -> usize {
        lock(&self.duties).len()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

impl PwmOutput for RecordingPwm {
    fn set_duty(&mut self, duty: u32) -> Result<(), BoxError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err("pwm channel unavailable".into());
        }
        lock(&self.duties).push(duty);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedButton(Arc<AtomicU32>);

impl SharedButton {
    pub fn press(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

impl PressCounter for SharedButton {
    fn count(&mut self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Line sink collecting lines in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

impl LineSink for MemorySink {
    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(Box::new(std::io::Error::other("broken pipe")));
        }
        lock(&self.lines).push(line.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay(Arc<Mutex<Vec<DisplayFrame>>>);

impl RecordingDisplay {
    pub fn frames(&self) -> Vec<DisplayFrame> {
        lock(&self.0).clone()
    }
}

impl StatusDisplay for RecordingDisplay {
    fn render(&mut self, frame: &DisplayFrame) -> Result<(), BoxError> {
        lock(&self.0).push(frame.clone());
        Ok(())
    }
}

/// One of each mock, wired into a builder by [`MockRig::builder`].
#[derive(Debug, Clone, Default)]
pub struct MockRig {
    pub fan_dial: SharedDial,
    pub heat_dial: SharedDial,
    pub bean: SharedThermocouple,
    pub intake: SharedThermocouple,
    pub load_cell: SharedLoadCell,
    pub heater: RecordingPwm,
    pub fan: RecordingPwm,
    pub button: SharedButton,
    pub telemetry: MemorySink,
    pub display: RecordingDisplay,
}

impl MockRig {
    pub fn builder(&self) -> crate::runner::RoasterBuilder {
        crate::runner::Roaster::builder()
            .with_dials(self.fan_dial.clone(), self.heat_dial.clone())
            .with_thermocouples(self.bean.clone(), self.intake.clone())
            .with_load_cell(self.load_cell.clone())
            .with_outputs(self.heater.clone(), self.fan.clone())
            .with_button(self.button.clone())
            .with_telemetry(self.telemetry.clone())
            .with_display(self.display.clone())
    }
}
