use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll `done` until it returns true or `timeout` expires, sleeping
/// `poll_interval` between polls.
pub fn wait_until_with_timeout(
    mut done: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !done() {
        if Instant::now() >= deadline {
            return Err(HwError::DataReadyTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}

/// Wait until the `is_high` predicate becomes false (line pulled low).
/// HX711 signals data-ready this way.
pub fn wait_until_low_with_timeout(
    mut is_high: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    wait_until_with_timeout(|| !is_high(), timeout, poll_interval)
}

/// Convert a Celsius reading to Fahrenheit.
#[inline]
pub fn c_to_f(c: f32) -> f32 {
    c * 9.0 / 5.0 + 32.0
}

const MAX6675_OPEN_CIRCUIT: u16 = 0x0004;

/// Decode a raw MAX6675 frame to Fahrenheit: bits 14..3 carry quarter
/// degrees Celsius, bit 2 flags an open thermocouple.
pub fn decode_max6675(frame: u16) -> Result<f32> {
    if frame & MAX6675_OPEN_CIRCUIT != 0 {
        return Err(HwError::ThermocoupleOpen);
    }
    let quarter_c = (frame >> 3) & 0x0FFF;
    Ok(c_to_f(f32::from(quarter_c) * 0.25))
}
