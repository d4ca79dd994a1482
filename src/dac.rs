//! MCP4725 12-bit DAC on the Pi's I2C bus. One fast-write per poll cycle.

use anyhow::Result;
use linux_embedded_hal::I2cdev;
use mcp4725::{MCP4725, PowerDown};

pub struct Dac {
    dev: MCP4725<I2cdev>,
}

impl Dac {
    /// `address` is the full 7-bit device address (0x62 for the Adafruit
    /// breakout); the driver wants only the three user-programmable bits.
    pub fn open(bus: &str, address: u8) -> Result<Dac> {
        let i2c = I2cdev::new(bus)?;
        let dev = MCP4725::new(i2c, address & 0b111);
        Ok(Dac { dev })
    }

    /// Push a count to the DAC. The fast-write command carries 12 bits, so
    /// the value is capped at 4095 the way the Adafruit driver caps it.
    pub fn set_count(&mut self, count: i32) -> Result<()> {
        let value = count.max(0).min(4095) as u16;
        self.dev.set_dac_fast(PowerDown::Normal, value)?;
        Ok(())
    }
}
