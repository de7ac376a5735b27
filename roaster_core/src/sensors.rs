//! Rate-limited sensor acquisition.
//!
//! Dials are read every tick; thermocouples and the load cell only once their
//! minimum interval has elapsed. Every channel keeps its last good value, so a
//! failed or skipped read never clears what the state machine sees.

use std::sync::Arc;
use std::time::Duration;

use roaster_traits::{Clock, Dial, LoadCell, Thermocouple};

use crate::calibration::Calibration;
use crate::config::{PlausibleRange, RoasterSettings};
use crate::error::{Channel, RoasterError, SensorError};
use crate::hw_error::map_sensor_error;
use crate::util::{RateLimiter, max_for_bits};

/// Last-known value of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<T> {
    /// Last good value; the type's zero until the first successful read.
    pub value: T,
    /// When `value` was read (ms since controller start).
    pub sampled_at_ms: u64,
    /// A read was attempted on the current tick.
    pub refreshed: bool,
    /// Outcome of the most recent attempt, if it failed.
    pub fault: Option<SensorError>,
    has_value: bool,
}

impl<T: Copy + Default> Default for Reading<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            sampled_at_ms: 0,
            refreshed: false,
            fault: None,
            has_value: false,
        }
    }
}

impl<T: Copy> Reading<T> {
    /// A value freshly read at `sampled_at_ms`.
    pub const fn ok(value: T, sampled_at_ms: u64) -> Self {
        Self {
            value,
            sampled_at_ms,
            refreshed: true,
            fault: None,
            has_value: true,
        }
    }

    /// A failed attempt on top of this reading, keeping its last good value.
    #[must_use]
    pub fn with_fault(mut self, fault: SensorError) -> Self {
        self.refreshed = true;
        self.fault = Some(fault);
        self
    }

    pub const fn has_value(&self) -> bool {
        self.has_value
    }

    /// Has a value and the latest attempt succeeded.
    pub const fn usable(&self) -> bool {
        self.has_value && self.fault.is_none()
    }

    pub const fn get(&self) -> Option<T> {
        if self.usable() { Some(self.value) } else { None }
    }

    fn record(&mut self, channel: Channel, now_ms: u64, res: Result<T, SensorError>) {
        self.refreshed = true;
        match res {
            Ok(v) => {
                if self.fault.take().is_some() {
                    tracing::info!(%channel, "sensor recovered");
                }
                self.value = v;
                self.sampled_at_ms = now_ms;
                self.has_value = true;
            }
            Err(e) => {
                if self.fault.as_ref() == Some(&e) {
                    tracing::trace!(%channel, error = %e, "sensor still faulted");
                } else {
                    tracing::warn!(%channel, error = %e, "sensor fault");
                }
                self.fault = Some(e);
            }
        }
    }
}

/// Everything the controller knows about its inputs after one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSnapshot {
    pub fan_raw: Reading<u16>,
    pub heat_raw: Reading<u16>,
    pub bean_temp_f: Reading<f32>,
    pub intake_temp_f: Reading<f32>,
    pub raw_weight: Reading<i32>,
    /// `raw_weight` through the calibration in effect when it was read.
    pub weight_units: f32,
}

impl SensorSnapshot {
    pub const fn fault(&self, channel: Channel) -> Option<&SensorError> {
        match channel {
            Channel::FanDial => self.fan_raw.fault.as_ref(),
            Channel::HeatDial => self.heat_raw.fault.as_ref(),
            Channel::BeanTemp => self.bean_temp_f.fault.as_ref(),
            Channel::IntakeTemp => self.intake_temp_f.fault.as_ref(),
            Channel::Weight => self.raw_weight.fault.as_ref(),
        }
    }

    /// Channels whose most recent read failed.
    pub fn faulted_channels(&self) -> impl Iterator<Item = Channel> + '_ {
        Channel::ALL
            .into_iter()
            .filter(|c| self.fault(*c).is_some())
    }

    fn clear_refreshed(&mut self) {
        self.fan_raw.refreshed = false;
        self.heat_raw.refreshed = false;
        self.bean_temp_f.refreshed = false;
        self.intake_temp_f.refreshed = false;
        self.raw_weight.refreshed = false;
    }
}

/// Scale operations the state machine needs during Tare and Calibrate.
pub trait ScaleControl {
    /// Average a burst of reads and make it the new zero. Returns the zero counts.
    fn tare(&mut self) -> Result<i32, RoasterError>;
    /// Average a burst of reads with `known_units` on the scale and solve for
    /// the gain. Returns the new gain.
    fn calibrate(&mut self, known_units: f32) -> Result<f32, RoasterError>;
    fn set_zero_counts(&mut self, zero_counts: i32);
    fn set_gain(&mut self, gain_units_per_count: f32);
    fn calibration(&self) -> Calibration;
}

/// Load cell plus the calibration that turns its counts into units.
pub struct WeightChannel {
    cell: Box<dyn LoadCell>,
    calibration: Calibration,
    read_timeout: Duration,
    samples: u32,
    timeout_ms: u64,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl core::fmt::Debug for WeightChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeightChannel")
            .field("calibration", &self.calibration)
            .field("samples", &self.samples)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl WeightChannel {
    pub fn new(
        cell: Box<dyn LoadCell>,
        calibration: Calibration,
        read_timeout: Duration,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            cell,
            calibration,
            read_timeout,
            samples: 10,
            timeout_ms: 5_000,
            clock,
        }
    }

    /// Samples averaged and overall bound for `tare`/`calibrate`.
    pub fn with_averaging(mut self, samples: u32, timeout_ms: u64) -> Self {
        self.samples = samples.max(1);
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn read_raw(&mut self) -> Result<i32, SensorError> {
        self.cell
            .read(self.read_timeout)
            .map_err(|e| map_sensor_error(&*e))
    }

    pub fn to_units(&self, raw: i32) -> f32 {
        self.calibration.to_units(raw)
    }

    /// Blocking average of `samples` reads. Failed reads are retried until
    /// three times the sample count has been attempted or the overall timeout
    /// elapses.
    pub fn average_counts(&mut self) -> Result<i32, RoasterError> {
        let start = self.clock.now();
        let max_attempts = self.samples.saturating_mul(3);
        let mut sum: i64 = 0;
        let mut n: u32 = 0;
        let mut attempts: u32 = 0;
        let mut last_err = SensorError::Timeout;

        while n < self.samples {
            if self.clock.ms_since(start) >= self.timeout_ms {
                return Err(RoasterError::CalibrationTimeout);
            }
            if attempts >= max_attempts {
                return Err(RoasterError::Sensor {
                    channel: Channel::Weight,
                    source: last_err,
                });
            }
            attempts += 1;
            match self.read_raw() {
                Ok(raw) => {
                    sum += i64::from(raw);
                    n += 1;
                }
                Err(e) => {
                    tracing::debug!(error = %e, attempts, "averaging read failed");
                    last_err = e;
                }
            }
        }

        let mean = (sum as f64 / f64::from(n)).round();
        Ok(mean.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
    }
}

impl ScaleControl for WeightChannel {
    fn tare(&mut self) -> Result<i32, RoasterError> {
        let zero = self.average_counts()?;
        self.set_zero_counts(zero);
        Ok(zero)
    }

    fn calibrate(&mut self, known_units: f32) -> Result<f32, RoasterError> {
        let loaded = self.average_counts()?;
        let gain = self.calibration.span_gain(known_units, loaded)?;
        self.set_gain(gain);
        Ok(gain)
    }

    fn set_zero_counts(&mut self, zero_counts: i32) {
        tracing::info!(zero_counts, "scale zero set");
        self.calibration.zero_counts = zero_counts;
    }

    fn set_gain(&mut self, gain_units_per_count: f32) {
        tracing::info!(gain_units_per_count, "scale gain set");
        self.calibration.gain_units_per_count = gain_units_per_count;
    }

    fn calibration(&self) -> Calibration {
        self.calibration
    }
}

/// The five input devices, boxed.
pub struct SensorDevices {
    pub fan_dial: Box<dyn Dial>,
    pub heat_dial: Box<dyn Dial>,
    pub bean: Box<dyn Thermocouple>,
    pub intake: Box<dyn Thermocouple>,
    pub load_cell: Box<dyn LoadCell>,
}

/// Owns the input devices and the per-class rate limiters.
pub struct SensorAcquisition {
    fan_dial: Box<dyn Dial>,
    heat_dial: Box<dyn Dial>,
    bean: Box<dyn Thermocouple>,
    intake: Box<dyn Thermocouple>,
    scale: WeightChannel,
    thermocouple_rl: RateLimiter,
    load_cell_rl: RateLimiter,
    plausible: PlausibleRange,
    max_raw: u16,
    snapshot: SensorSnapshot,
}

impl core::fmt::Debug for SensorAcquisition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SensorAcquisition")
            .field("scale", &self.scale)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl SensorAcquisition {
    pub fn new(
        devices: SensorDevices,
        settings: &RoasterSettings,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let scale = WeightChannel::new(
            devices.load_cell,
            settings.initial_calibration,
            Duration::from_millis(settings.sampling.read_timeout_ms),
            clock,
        )
        .with_averaging(settings.calibration.samples, settings.calibration.timeout_ms);
        let max_raw = u16::try_from(max_for_bits(settings.actuator.adc_bits)).unwrap_or(u16::MAX);

        Self {
            fan_dial: devices.fan_dial,
            heat_dial: devices.heat_dial,
            bean: devices.bean,
            intake: devices.intake,
            scale,
            thermocouple_rl: RateLimiter::new(settings.sampling.thermocouple_ms),
            load_cell_rl: RateLimiter::new(settings.sampling.load_cell_ms),
            plausible: settings.plausible,
            max_raw,
            snapshot: SensorSnapshot::default(),
        }
    }

    /// Refresh every channel that is due and return the updated snapshot.
    pub fn sample(&mut self, now_ms: u64) -> &SensorSnapshot {
        let snap = &mut self.snapshot;
        snap.clear_refreshed();

        let max_raw = self.max_raw;
        snap.fan_raw
            .record(Channel::FanDial, now_ms, read_dial(self.fan_dial.as_mut(), max_raw));
        snap.heat_raw
            .record(Channel::HeatDial, now_ms, read_dial(self.heat_dial.as_mut(), max_raw));

        if self.thermocouple_rl.fire(now_ms) {
            let band = self.plausible;
            snap.bean_temp_f
                .record(Channel::BeanTemp, now_ms, read_temp(self.bean.as_mut(), band));
            snap.intake_temp_f
                .record(Channel::IntakeTemp, now_ms, read_temp(self.intake.as_mut(), band));
            tracing::trace!(
                bean_f = snap.bean_temp_f.value,
                intake_f = snap.intake_temp_f.value,
                "thermocouples refreshed"
            );
        }

        if self.load_cell_rl.fire(now_ms) {
            let res = self.scale.read_raw();
            if let Ok(raw) = res {
                snap.weight_units = self.scale.to_units(raw);
            }
            snap.raw_weight.record(Channel::Weight, now_ms, res);
        }

        &self.snapshot
    }

    pub const fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    pub fn scale_mut(&mut self) -> &mut WeightChannel {
        &mut self.scale
    }

    pub const fn scale(&self) -> &WeightChannel {
        &self.scale
    }

    pub const fn max_raw(&self) -> u16 {
        self.max_raw
    }
}

fn read_dial(dial: &mut dyn Dial, max_raw: u16) -> Result<u16, SensorError> {
    dial.read_raw()
        .map(|v| v.min(max_raw))
        .map_err(|e| map_sensor_error(&*e))
}

fn read_temp(tc: &mut dyn Thermocouple, band: PlausibleRange) -> Result<f32, SensorError> {
    let t = tc.read_fahrenheit().map_err(|e| map_sensor_error(&*e))?;
    if band.contains(t) {
        Ok(t)
    } else {
        Err(SensorError::Implausible(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_read_keeps_last_value_and_timestamp() {
        let mut r: Reading<f32> = Reading::default();
        r.record(Channel::BeanTemp, 10, Ok(200.0));
        r.record(Channel::BeanTemp, 20, Err(SensorError::Timeout));
        assert_eq!(r.value, 200.0);
        assert_eq!(r.sampled_at_ms, 10);
        assert!(r.has_value());
        assert!(!r.usable());
        assert_eq!(r.get(), None);
        r.record(Channel::BeanTemp, 30, Ok(201.0));
        assert_eq!(r.get(), Some(201.0));
    }

    #[test]
    fn never_read_channel_holds_zero_and_fault() {
        let mut r: Reading<i32> = Reading::default();
        r.record(Channel::Weight, 0, Err(SensorError::Hardware("x".into())));
        assert_eq!(r.value, 0);
        assert!(!r.has_value());
        assert!(r.fault.is_some());
    }

    #[test]
    fn implausible_band_rejects_nan_and_outliers() {
        let band = PlausibleRange::default();
        assert!(band.contains(70.0));
        assert!(!band.contains(f32::NAN));
        assert!(!band.contains(1200.0));
        assert!(!band.contains(-41.0));
    }
}
