//! `roaster_traits` implementations over the Raspberry Pi peripherals.
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use roaster_traits::{BoxError, Dial, LoadCell, PressCounter, PwmOutput, Thermocouple};
use rppal::spi::SlaveSelect;

use crate::error::{HwError, Result};
use crate::gpio_button::GpioButton;
use crate::hx711::Hx711;
use crate::max6675::Max6675;
use crate::mcp3208::Mcp3208;
use crate::pwm::HardwarePwm;

/// Map a configured chip-select index to an SPI slave select line.
pub fn slave_select(index: u8) -> Result<SlaveSelect> {
    match index {
        0 => Ok(SlaveSelect::Ss0),
        1 => Ok(SlaveSelect::Ss1),
        2 => Ok(SlaveSelect::Ss2),
        other => Err(HwError::Spi(format!("no such chip select {other}"))),
    }
}

pub struct HardwareLoadCell {
    hx711: Hx711,
    max_attempts: u32,
}

impl HardwareLoadCell {
    pub fn new(dt_pin: u8, sck_pin: u8) -> Result<Self> {
        // 25 pulses: channel A, gain 128
        let hx711 = Hx711::new(dt_pin, sck_pin, 25)?;
        Ok(Self {
            hx711,
            max_attempts: 3,
        })
    }
}

impl LoadCell for HardwareLoadCell {
    fn read(&mut self, timeout: Duration) -> std::result::Result<i32, BoxError> {
        let mut attempts = 0;
        loop {
            match self.hx711.read_with_timeout(timeout) {
                Ok(raw) => {
                    tracing::trace!(raw, "hx711 sample");
                    return Ok(raw);
                }
                Err(HwError::DataReadyTimeout) if attempts < self.max_attempts => {
                    attempts += 1;
                    tracing::warn!(retries = attempts, "load cell timeout, retrying");
                }
                Err(e) => {
                    tracing::error!(error = %e, "load cell read error");
                    return Err(Box::new(e));
                }
            }
        }
    }
}

/// One potentiometer on a shared MCP3208.
pub struct AdcDial {
    adc: Rc<RefCell<Mcp3208>>,
    channel: u8,
}

impl AdcDial {
    /// Open the ADC once and hand out one dial per channel.
    pub fn pair(ss: u8, fan_channel: u8, heat_channel: u8) -> Result<(Self, Self)> {
        let adc = Rc::new(RefCell::new(Mcp3208::new(slave_select(ss)?)?));
        Ok((
            Self {
                adc: adc.clone(),
                channel: fan_channel,
            },
            Self {
                adc,
                channel: heat_channel,
            },
        ))
    }
}

impl Dial for AdcDial {
    fn read_raw(&mut self) -> std::result::Result<u16, BoxError> {
        Ok(self.adc.borrow_mut().read_channel(self.channel)?)
    }
}

pub struct HardwareThermocouple {
    chip: Max6675,
}

impl HardwareThermocouple {
    pub fn new(ss: u8) -> Result<Self> {
        Ok(Self {
            chip: Max6675::new(slave_select(ss)?)?,
        })
    }
}

impl Thermocouple for HardwareThermocouple {
    fn read_fahrenheit(&mut self) -> std::result::Result<f32, BoxError> {
        Ok(self.chip.read_fahrenheit()?)
    }
}

impl PwmOutput for HardwarePwm {
    fn set_duty(&mut self, duty: u32) -> std::result::Result<(), BoxError> {
        Ok(HardwarePwm::set_duty(self, duty)?)
    }
}

impl PressCounter for GpioButton {
    fn count(&mut self) -> u32 {
        self.presses()
    }
}
