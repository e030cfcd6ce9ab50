use {
    crate::{
        error::InitError,
        sensors::{open_bus, Reading, Sensor},
    },
    ::bme680::{
        Bme680, Error as DriverError, FieldData, FieldDataCondition, I2CAddress, IIRFilterSize,
        OversamplingSetting, PowerMode, SettingsBuilder, BME680_CHIP_ID,
    },
    anyhow::{anyhow, Result},
    embedded_hal::blocking::{
        delay::DelayMs,
        i2c::{Read, Write},
    },
    linux_embedded_hal::{Delay, I2cdev},
    log::{debug, info},
    std::{fmt::Debug, time::Duration},
};

const CHIP_ID_REGISTER: u8 = 0xD0;

const HEATER_DURATION: Duration = Duration::from_millis(150);
const HEATER_TEMPERATURE: u16 = 320;
const AMBIENT_TEMPERATURE: i8 = 25;
const BURN_IN_PERIOD_MS: u32 = 1000;
const BASELINE_SAMPLES: usize = 50;

pub type GasCapableSensor = GasSensor<I2cdev, Delay>;

/// BME680 with its gas heater enabled.
pub struct GasSensor<I2C, D> {
    dev: Bme680<I2C, D>,
    delay: D,
    /// Time one forced-mode measurement takes, heater included.
    profile: Duration,
    burn_in: Duration,
}

impl GasSensor<I2cdev, Delay> {
    pub const PRIMARY: I2CAddress = I2CAddress::Primary;
    pub const SECONDARY: I2CAddress = I2CAddress::Secondary;

    pub fn initialize(
        dev: &str,
        address: I2CAddress,
        burn_in: Duration,
    ) -> Result<Self, InitError> {
        Self::new(open_bus(dev)?, Delay, address, burn_in)
    }
}

impl<I2C, D> GasSensor<I2C, D>
where
    I2C: Read + Write,
    <I2C as Read>::Error: Debug,
    <I2C as Write>::Error: Debug,
    D: DelayMs<u8> + DelayMs<u32>,
{
    pub fn new(
        mut i2c: I2C,
        mut delay: D,
        address: I2CAddress,
        burn_in: Duration,
    ) -> Result<Self, InitError> {
        let id = identify(&mut i2c, address.addr())?;
        let mut dev = Bme680::init(i2c, &mut delay, address)
            .map_err(|e| init_error(address.addr(), id, e))?;

        let settings = SettingsBuilder::new()
            .with_humidity_oversampling(OversamplingSetting::OS2x)
            .with_pressure_oversampling(OversamplingSetting::OS4x)
            .with_temperature_oversampling(OversamplingSetting::OS8x)
            .with_temperature_filter(IIRFilterSize::Size3)
            .with_gas_measurement(HEATER_DURATION, HEATER_TEMPERATURE, AMBIENT_TEMPERATURE)
            .with_run_gas(true)
            .build();

        let profile = dev
            .get_profile_dur(&settings.0)
            .map_err(|e| init_error(address.addr(), id, e))?;
        dev.set_sensor_settings(&mut delay, settings)
            .map_err(|e| init_error(address.addr(), id, e))?;

        Ok(Self {
            dev,
            delay,
            profile,
            burn_in,
        })
    }

    /// Triggers one forced-mode measurement and waits it out.
    ///
    /// `None` if the chip still had no new data after the driver's polling.
    fn sample(&mut self) -> Result<Option<FieldData>> {
        self.dev
            .set_sensor_mode(&mut self.delay, PowerMode::ForcedMode)
            .or_else(|e| Err(anyhow!("Failed to trigger BME680 measurement: {:?}", e)))?;
        DelayMs::<u32>::delay_ms(&mut self.delay, self.profile.as_millis() as u32);

        let (data, condition) = self
            .dev
            .get_sensor_data(&mut self.delay)
            .or_else(|e| Err(anyhow!("Failed to read from BME680: {:?}", e)))?;

        Ok(match condition {
            FieldDataCondition::NewData => Some(data),
            FieldDataCondition::Unchanged => None,
        })
    }

    /// Gas readings taken once the heater reached its target, one per period.
    fn burn_in_samples(&mut self) -> Result<Vec<f32>> {
        let rounds = self.burn_in.as_millis() / BURN_IN_PERIOD_MS as u128;
        let mut samples = vec![];

        for _ in 0..rounds {
            match self.sample()? {
                Some(data) if data.heat_stable() => {
                    let gas = data.gas_resistance_ohm() as f32;
                    debug!("Burn-in gas resistance: {:.0} ohms", gas);
                    samples.push(gas);
                }
                _ => debug!("Burn-in sample skipped, heater not stable"),
            }
            DelayMs::<u32>::delay_ms(&mut self.delay, BURN_IN_PERIOD_MS);
        }

        Ok(samples)
    }
}

impl<I2C, D> Sensor for GasSensor<I2C, D>
where
    I2C: Read + Write,
    <I2C as Read>::Error: Debug,
    <I2C as Write>::Error: Debug,
    D: DelayMs<u8> + DelayMs<u32>,
{
    /// Runs the heater for the burn-in period so gas readings settle.
    fn warm_up(&mut self) -> Result<()> {
        if self.burn_in < Duration::from_millis(BURN_IN_PERIOD_MS as u64) {
            return Ok(());
        }

        info!("Burning in BME680 for {}s", self.burn_in.as_secs());
        let samples = self.burn_in_samples()?;

        match gas_baseline(&samples) {
            Some(baseline) => info!("Burn-in complete, gas baseline {:.0} ohms", baseline),
            None => info!("Burn-in complete, heater never stabilized"),
        }

        Ok(())
    }

    fn measure(&mut self) -> Result<Reading> {
        let data = self
            .sample()?
            .ok_or_else(|| anyhow!("BME680 measurement did not complete"))?;

        Ok(Reading {
            temperature: data.temperature_celsius(),
            humidity: data.humidity_percent(),
            pressure: data.pressure_hpa(),
            gas_resistance: Some(data.gas_resistance_ohm() as f32),
        })
    }
}

/// Checks the chip id before the driver soft-resets whatever sits at `address`.
fn identify<I2C>(i2c: &mut I2C, address: u8) -> Result<u8, InitError>
where
    I2C: Read + Write,
{
    let mut id = [0];
    i2c.write(address, &[CHIP_ID_REGISTER])
        .map_err(|_| InitError::Absent { address })?;
    i2c.read(address, &mut id)
        .map_err(|_| InitError::Absent { address })?;

    if id[0] != BME680_CHIP_ID {
        return Err(InitError::WrongDevice {
            address,
            expected: BME680_CHIP_ID,
            found: id[0],
        });
    }

    Ok(id[0])
}

fn init_error<R: Debug, W: Debug>(address: u8, found: u8, e: DriverError<R, W>) -> InitError {
    match e {
        DriverError::I2CRead(_) | DriverError::I2CWrite(_) => InitError::Absent { address },
        DriverError::DeviceNotFound => InitError::WrongDevice {
            address,
            expected: BME680_CHIP_ID,
            found,
        },
        other => InitError::Driver {
            chip: "BME680",
            reason: format!("{:?}", other),
        },
    }
}

/// Mean of the most recent burn-in samples.
fn gas_baseline(samples: &[f32]) -> Option<f32> {
    let recent = &samples[samples.len().saturating_sub(BASELINE_SAMPLES)..];
    if recent.is_empty() {
        return None;
    }
    Some(recent.iter().sum::<f32>() / recent.len() as f32)
}
