use {
    crate::{
        error::InitError,
        sensors::{hts221::Hts221, lps25h::Lps25h, open_bus, Reading, Sensor},
    },
    anyhow::Result,
    embedded_hal::blocking::i2c::{Write, WriteRead},
    linux_embedded_hal::I2cdev,
    std::fmt::Debug,
};

pub type BoardSensor = SenseHat<I2cdev>;

/// The Raspberry Pi Sense HAT's environmental chips. There is no gas sensor.
pub struct SenseHat<I2C> {
    hts221: Hts221<I2C>,
    lps25h: Lps25h<I2C>,
}

impl SenseHat<I2cdev> {
    pub fn initialize(dev: &str) -> Result<Self, InitError> {
        Self::new(open_bus(dev)?, open_bus(dev)?)
    }
}

impl<I2C, E> SenseHat<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: Debug,
{
    /// Both chips must answer for the board to count as present.
    pub fn new(humidity_bus: I2C, pressure_bus: I2C) -> Result<Self, InitError> {
        Ok(Self {
            hts221: Hts221::new(humidity_bus)?,
            lps25h: Lps25h::new(pressure_bus)?,
        })
    }
}

impl<I2C, E> Sensor for SenseHat<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: Debug,
{
    fn measure(&mut self) -> Result<Reading> {
        Ok(Reading {
            temperature: self.hts221.temperature()?,
            humidity: self.hts221.humidity()?,
            pressure: self.lps25h.pressure()?,
            gas_resistance: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::sensors::{hts221, lps25h, testing::RegisterBus},
    };

    fn board() -> RegisterBus {
        lps25h::tests::present(hts221::tests::calibrated(RegisterBus::default()))
            .with(0x5F, 0x28, &[0xF4, 0x01])
            .with(0x5F, 0x2A, &[0xE8, 0x03])
            .with(0x5C, 0x28, &[0x00, 0x54, 0x3F])
    }

    #[test]
    fn reading_never_has_gas() {
        let mut hat = SenseHat::new(board(), board()).unwrap();
        let reading = hat.measure().unwrap();

        assert!((reading.temperature - 20.0).abs() < 1e-4);
        assert!((reading.humidity - 50.0).abs() < 1e-4);
        assert!((reading.pressure - 1013.25).abs() < 1e-3);
        assert_eq!(reading.gas_resistance, None);
    }

    #[test]
    fn warm_up_is_a_no_op() {
        let mut hat = SenseHat::new(board(), board()).unwrap();
        assert!(hat.warm_up().is_ok());
    }

    #[test]
    fn missing_pressure_chip_is_absent() {
        let humidity_only = hts221::tests::calibrated(RegisterBus::default());
        let result = SenseHat::new(humidity_only, RegisterBus::default());

        assert!(matches!(result, Err(InitError::Absent { address: 0x5C })));
    }
}
