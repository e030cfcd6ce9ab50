//! LPS25H barometric pressure sensor, as fitted to the Sense HAT.

use {
    crate::error::InitError,
    anyhow::{anyhow, Result},
    embedded_hal::blocking::i2c::{Write, WriteRead},
    std::fmt::Debug,
};

const WHO_AM_I: u8 = 0x0F;
const RES_CONF: u8 = 0x10;
const CTRL_REG1: u8 = 0x20;
const PRESS_OUT_XL: u8 = 0x28;

const AUTO_INCREMENT: u8 = 0x80;

pub struct Lps25h<I2C> {
    i2c: I2C,
}

impl<I2C, E> Lps25h<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: Debug,
{
    pub const ADDRESS: u8 = 0x5C;
    const DEVICE_ID: u8 = 0xBD;

    pub fn new(mut i2c: I2C) -> Result<Self, InitError> {
        let mut id = [0];
        i2c.write_read(Self::ADDRESS, &[WHO_AM_I], &mut id)
            .map_err(|_| InitError::Absent {
                address: Self::ADDRESS,
            })?;
        if id[0] != Self::DEVICE_ID {
            return Err(InitError::WrongDevice {
                address: Self::ADDRESS,
                expected: Self::DEVICE_ID,
                found: id[0],
            });
        }

        let fault = |e: E| InitError::Driver {
            chip: "LPS25H",
            reason: format!("{:?}", e),
        };

        // Power on, 25 Hz, block data update.
        i2c.write(Self::ADDRESS, &[CTRL_REG1, 0xC4]).map_err(fault)?;
        i2c.write(Self::ADDRESS, &[RES_CONF, 0x05]).map_err(fault)?;

        Ok(Self { i2c })
    }

    fn read(&mut self, register: u8, buf: &mut [u8]) -> Result<()> {
        self.i2c
            .write_read(Self::ADDRESS, &[register | AUTO_INCREMENT], buf)
            .or_else(|e| Err(anyhow!("Failed to read from LPS25H: {:?}", e)))
    }

    /// Hectopascals.
    pub fn pressure(&mut self) -> Result<f32> {
        let mut buf = [0; 3];
        self.read(PRESS_OUT_XL, &mut buf)?;

        // Sign-extend the 24-bit reading.
        let raw = i32::from_le_bytes([0, buf[0], buf[1], buf[2]]) >> 8;
        Ok(raw as f32 / 4096.0)
    }
}
