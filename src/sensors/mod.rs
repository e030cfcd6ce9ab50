use {
    crate::{
        config::Settings,
        error::{InitError, NotFound},
    },
    anyhow::Result,
    linux_embedded_hal::I2cdev,
    log::{info, warn},
};

mod bme680;
mod hts221;
mod lps25h;
mod sense_hat;
#[cfg(test)]
pub(crate) mod testing;

pub use {
    self::bme680::{GasCapableSensor, GasSensor},
    sense_hat::{BoardSensor, SenseHat},
};

/// One normalized sample, whatever sensor produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Percent relative humidity.
    pub humidity: f32,
    /// Hectopascals.
    pub pressure: f32,
    /// Ohms. `None` when the sensor has no gas element.
    pub gas_resistance: Option<f32>,
}

pub trait Sensor {
    /// One-off preparation before the first `measure`.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }

    fn measure(&mut self) -> Result<Reading>;
}

/// The sensor chosen at startup.
pub enum AnySensor {
    GasCapable(GasCapableSensor),
    BoardSensor(BoardSensor),
}

impl AnySensor {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::GasCapable(_) => "BME680",
            Self::BoardSensor(_) => "Sense HAT (no gas measurements)",
        }
    }
}

impl Sensor for AnySensor {
    fn warm_up(&mut self) -> Result<()> {
        match self {
            Self::GasCapable(dev) => dev.warm_up(),
            Self::BoardSensor(dev) => dev.warm_up(),
        }
    }

    fn measure(&mut self) -> Result<Reading> {
        match self {
            Self::GasCapable(dev) => dev.measure(),
            Self::BoardSensor(dev) => dev.measure(),
        }
    }
}

fn open_bus(dev: &str) -> Result<I2cdev, InitError> {
    I2cdev::new(dev).map_err(|e| InitError::Bus {
        dev: dev.to_string(),
        reason: format!("{:?}", e),
    })
}

/// A named, one-shot attempt at bringing up a sensor.
pub struct Candidate<'a, T> {
    name: String,
    init: Box<dyn FnOnce() -> Result<T, InitError> + 'a>,
}

impl<'a, T> Candidate<'a, T> {
    pub fn new<S, F>(name: S, init: F) -> Self
    where
        S: Into<String>,
        F: FnOnce() -> Result<T, InitError> + 'a,
    {
        Self {
            name: name.into(),
            init: Box::new(init),
        }
    }
}

/// Tries each candidate in order and returns the first that initializes.
///
/// Failures are logged and skipped. Nothing after the first success is attempted.
pub fn probe<'a, T, I>(candidates: I) -> Result<T, NotFound>
where
    I: IntoIterator<Item = Candidate<'a, T>>,
{
    for candidate in candidates {
        match (candidate.init)() {
            Ok(sensor) => {
                info!("Found {}", candidate.name);
                return Ok(sensor);
            }
            Err(e) => warn!("{} not found: {}", candidate.name, e),
        }
    }

    Err(NotFound)
}

/// The supported hardware, in priority order.
pub fn candidates(settings: &Settings) -> Vec<Candidate<'_, AnySensor>> {
    let dev = settings.i2c_dev.as_str();
    let burn_in = settings.burn_in;

    vec![
        Candidate::new("BME680 on 0x76", move || {
            GasCapableSensor::initialize(dev, GasCapableSensor::PRIMARY, burn_in)
                .map(AnySensor::GasCapable)
        }),
        Candidate::new("BME680 on 0x77", move || {
            GasCapableSensor::initialize(dev, GasCapableSensor::SECONDARY, burn_in)
                .map(AnySensor::GasCapable)
        }),
        Candidate::new("Sense HAT", move || {
            SenseHat::initialize(dev).map(AnySensor::BoardSensor)
        }),
    ]
}
