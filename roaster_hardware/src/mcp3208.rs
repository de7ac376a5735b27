use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use crate::error::{HwError, Result};

const SPI_CLOCK_HZ: u32 = 1_000_000;

/// MCP3208 8-channel 12-bit SPI ADC; the dials hang off two of its inputs.
pub struct Mcp3208 {
    spi: Spi,
}

impl Mcp3208 {
    pub fn new(ss: SlaveSelect) -> Result<Self> {
        let spi = Spi::new(Bus::Spi0, ss, SPI_CLOCK_HZ, Mode::Mode0)
            .map_err(|e| HwError::Spi(format!("open mcp3208: {e}")))?;
        Ok(Self { spi })
    }

    /// Single-ended conversion on `channel` (0..=7).
    pub fn read_channel(&mut self, channel: u8) -> Result<u16> {
        if channel > 7 {
            return Err(HwError::AdcChannel(channel));
        }
        let tx = [0x06 | (channel >> 2), (channel & 0x03) << 6, 0x00];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok((u16::from(rx[1] & 0x0F) << 8) | u16::from(rx[2]))
    }
}
