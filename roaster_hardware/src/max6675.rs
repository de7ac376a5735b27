use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use crate::error::{HwError, Result};
use crate::util::decode_max6675;

const SPI_CLOCK_HZ: u32 = 1_000_000;

/// MAX6675 K-type thermocouple amplifier (read-only SPI, 0.25 °C resolution).
pub struct Max6675 {
    spi: Spi,
}

impl Max6675 {
    pub fn new(ss: SlaveSelect) -> Result<Self> {
        let spi = Spi::new(Bus::Spi0, ss, SPI_CLOCK_HZ, Mode::Mode0)
            .map_err(|e| HwError::Spi(format!("open max6675: {e}")))?;
        Ok(Self { spi })
    }

    pub fn read_fahrenheit(&mut self) -> Result<f32> {
        let mut buf = [0u8; 2];
        self.spi
            .read(&mut buf)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        decode_max6675(u16::from_be_bytes(buf))
    }
}
