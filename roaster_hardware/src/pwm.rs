use rppal::pwm::{Channel, Polarity, Pwm};

use crate::error::{HwError, Result};

/// Hardware PWM channel driven with a native integer duty range.
pub struct HardwarePwm {
    pwm: Pwm,
    max_duty: u32,
}

impl HardwarePwm {
    pub fn new(channel: u8, frequency_hz: f64, max_duty: u32) -> Result<Self> {
        let channel = match channel {
            0 => Channel::Pwm0,
            1 => Channel::Pwm1,
            other => return Err(HwError::Pwm(format!("no such pwm channel {other}"))),
        };
        let pwm = Pwm::with_frequency(channel, frequency_hz, 0.0, Polarity::Normal, true)
            .map_err(|e| HwError::Pwm(format!("open pwm: {e}")))?;
        Ok(Self {
            pwm,
            max_duty: max_duty.max(1),
        })
    }

    pub fn set_duty(&mut self, duty: u32) -> Result<()> {
        let frac = f64::from(duty.min(self.max_duty)) / f64::from(self.max_duty);
        self.pwm
            .set_duty_cycle(frac)
            .map_err(|e| HwError::Pwm(e.to_string()))
    }
}
