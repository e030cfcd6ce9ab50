//! HTS221 humidity and temperature sensor, as fitted to the Sense HAT.

use {
    crate::error::InitError,
    anyhow::{anyhow, Result},
    embedded_hal::blocking::i2c::{Write, WriteRead},
    std::fmt::Debug,
};

const WHO_AM_I: u8 = 0x0F;
const AV_CONF: u8 = 0x10;
const CTRL_REG1: u8 = 0x20;
const HUMIDITY_OUT: u8 = 0x28;
const TEMP_OUT: u8 = 0x2A;
const CALIBRATION: u8 = 0x30;

const AUTO_INCREMENT: u8 = 0x80;

/// Linear calibration points burned in at the factory.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Calibration {
    h0_rh: f32,
    h1_rh: f32,
    h0_out: i16,
    h1_out: i16,
    t0_degc: f32,
    t1_degc: f32,
    t0_out: i16,
    t1_out: i16,
}

impl Calibration {
    fn parse(c: &[u8; 16]) -> Self {
        let word = |i: usize| i16::from_le_bytes([c[i], c[i + 1]]);
        let msb = c[5] as u16;

        Self {
            h0_rh: c[0] as f32 / 2.0,
            h1_rh: c[1] as f32 / 2.0,
            t0_degc: (((msb & 0x03) << 8) | c[2] as u16) as f32 / 8.0,
            t1_degc: (((msb & 0x0C) << 6) | c[3] as u16) as f32 / 8.0,
            h0_out: word(6),
            h1_out: word(10),
            t0_out: word(12),
            t1_out: word(14),
        }
    }

    fn humidity(&self, raw: i16) -> f32 {
        let rh = interpolate(raw, self.h0_out, self.h1_out, self.h0_rh, self.h1_rh);
        rh.max(0.0).min(100.0)
    }

    fn temperature(&self, raw: i16) -> f32 {
        interpolate(raw, self.t0_out, self.t1_out, self.t0_degc, self.t1_degc)
    }
}

fn interpolate(raw: i16, x0: i16, x1: i16, y0: f32, y1: f32) -> f32 {
    let span = (x1 as f32) - (x0 as f32);
    if span == 0.0 {
        return y0;
    }
    y0 + (raw as f32 - x0 as f32) * (y1 - y0) / span
}

pub struct Hts221<I2C> {
    i2c: I2C,
    calibration: Calibration,
}

impl<I2C, E> Hts221<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: Debug,
{
    pub const ADDRESS: u8 = 0x5F;
    const DEVICE_ID: u8 = 0xBC;

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
            chip: "HTS221",
            reason: format!("{:?}", e),
        };

        // Power on, block data update, 1 Hz.
        i2c.write(Self::ADDRESS, &[CTRL_REG1, 0x85]).map_err(fault)?;
        i2c.write(Self::ADDRESS, &[AV_CONF, 0x1B]).map_err(fault)?;

        let mut raw = [0; 16];
        i2c.write_read(Self::ADDRESS, &[CALIBRATION | AUTO_INCREMENT], &mut raw)
            .map_err(fault)?;

        Ok(Self {
            i2c,
            calibration: Calibration::parse(&raw),
        })
    }

    fn read_word(&mut self, register: u8) -> Result<i16> {
        let mut buf = [0; 2];
        self.i2c
            .write_read(Self::ADDRESS, &[register | AUTO_INCREMENT], &mut buf)
            .or_else(|e| Err(anyhow!("Failed to read from HTS221: {:?}", e)))?;

        Ok(i16::from_le_bytes(buf))
    }

    /// Percent relative humidity.
    pub fn humidity(&mut self) -> Result<f32> {
        let raw = self.read_word(HUMIDITY_OUT)?;
        Ok(self.calibration.humidity(raw))
    }

    /// Degrees Celsius.
    pub fn temperature(&mut self) -> Result<f32> {
        let raw = self.read_word(TEMP_OUT)?;
        Ok(self.calibration.temperature(raw))
    }
}
