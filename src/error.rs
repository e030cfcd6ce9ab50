use thiserror::Error;

/// Why a sensor candidate could not be brought up during probing.
#[derive(Debug, Error)]
pub enum InitError {
    /// The I2C bus device itself could not be opened.
    #[error("failed to open {dev}: {reason}")]
    Bus { dev: String, reason: String },

    /// Nothing acknowledged at the address.
    #[error("no device at {address:#04x}")]
    Absent { address: u8 },

    /// A device answered, but it is not the chip we asked for.
    #[error("unexpected device id {found:#04x} at {address:#04x} (expected {expected:#04x})")]
    WrongDevice { address: u8, expected: u8, found: u8 },

    /// Any other fault reported by the driver.
    #[error("{chip}: {reason}")]
    Driver { chip: &'static str, reason: String },
}

/// None of the probe candidates responded.
#[derive(Debug, Error)]
#[error("no supported sensor found")]
pub struct NotFound;
