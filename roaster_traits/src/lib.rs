//! Device seams for the roaster control loop.
//!
//! Every peripheral the controller touches is reached through one of these
//! traits; `roaster_hardware` provides simulated and Raspberry Pi backends.
//! Errors cross the boundary boxed so that backends keep their own error
//! types (`roaster_core::hw_error` maps them back to typed errors).
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error returned by every device trait.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A potentiometer behind an ADC channel.
pub trait Dial {
    /// Raw ADC reading, `0..=MAX_RAW` for the configured resolution.
    fn read_raw(&mut self) -> Result<u16, BoxError>;
}

/// An amplified thermocouple channel.
pub trait Thermocouple {
    fn read_fahrenheit(&mut self) -> Result<f32, BoxError>;
}

/// Load-cell amplifier returning signed raw counts.
pub trait LoadCell {
    fn read(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError>;
}

/// One PWM output (heater or fan).
pub trait PwmOutput {
    /// Write a duty value in the channel's native resolution.
    fn set_duty(&mut self, duty: u32) -> Result<(), BoxError>;
}

/// Debounced button exposed as a monotonically increasing press counter.
pub trait PressCounter {
    fn count(&mut self) -> u32;
}

/// Line-oriented text sink (serial console, stdout, file).
pub trait LineSink {
    fn write_line(&mut self, line: &str) -> Result<(), BoxError>;
}

impl<T: LineSink + ?Sized> LineSink for Box<T> {
    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        (**self).write_line(line)
    }
}
