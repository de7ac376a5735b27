use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use rppal::gpio::{Gpio, InputPin, Level, Trigger};

use crate::error::{HwError, Result};

/// Push button counted on falling edges by the GPIO interrupt thread.
pub struct GpioButton {
    // Held so the interrupt stays registered.
    _pin: InputPin,
    presses: Arc<AtomicU32>,
}

impl GpioButton {
    pub fn new(pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("open button pin {pin}: {e}")))?
            .into_input_pullup();
        let presses = Arc::new(AtomicU32::new(0));
        let counter = presses.clone();
        pin.set_async_interrupt(Trigger::FallingEdge, move |level: Level| {
            if level == Level::Low {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        })
        .map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(Self { _pin: pin, presses })
    }

    pub fn presses(&self) -> u32 {
        self.presses.load(Ordering::Relaxed)
    }
}
