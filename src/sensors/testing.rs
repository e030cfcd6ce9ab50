use {
    embedded_hal::blocking::{
        delay::DelayMs,
        i2c::{Read, Write, WriteRead},
    },
    std::collections::HashMap,
};

#[derive(Debug, PartialEq)]
pub struct Nack;

/// An I2C bus backed by a register map. Unknown addresses NACK.
///
/// A one-byte write sets the register pointer for a following `read`.
#[derive(Debug, Default)]
pub struct RegisterBus {
    registers: HashMap<(u8, u8), u8>,
    pointer: u8,
    pub writes: Vec<(u8, u8, u8)>,
}

impl RegisterBus {
    pub fn with(mut self, address: u8, register: u8, values: &[u8]) -> Self {
        for (i, value) in values.iter().enumerate() {
            self.registers
                .insert((address, register.wrapping_add(i as u8)), *value);
        }
        self
    }

    fn responds(&self, address: u8) -> bool {
        self.registers.keys().any(|(a, _)| *a == address)
    }

    fn fill(&self, address: u8, start: u8, buffer: &mut [u8]) {
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self
                .registers
                .get(&(address, start.wrapping_add(i as u8)))
                .copied()
                .unwrap_or(0);
        }
    }
}

impl Write for RegisterBus {
    type Error = Nack;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Nack> {
        if !self.responds(address) {
            return Err(Nack);
        }
        match *bytes {
            [register] => self.pointer = register,
            [register, value] => {
                self.registers.insert((address, register), value);
                self.writes.push((address, register, value));
            }
            _ => return Err(Nack),
        }
        Ok(())
    }
}

impl Read for RegisterBus {
    type Error = Nack;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Nack> {
        if !self.responds(address) {
            return Err(Nack);
        }
        self.fill(address, self.pointer, buffer);
        Ok(())
    }
}

impl WriteRead for RegisterBus {
    type Error = Nack;

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Nack> {
        if !self.responds(address) {
            return Err(Nack);
        }
        // ST parts flag auto-increment with the top bit of the register address.
        let start = bytes.first().copied().ok_or(Nack)? & 0x7F;
        self.fill(address, start, buffer);
        Ok(())
    }
}

/// A delay that only counts the time it was asked to wait.
#[derive(Debug, Default)]
pub struct Clock {
    pub waited_ms: u64,
}

impl DelayMs<u8> for Clock {
    fn delay_ms(&mut self, ms: u8) {
        self.waited_ms += ms as u64;
    }
}

impl DelayMs<u32> for Clock {
    fn delay_ms(&mut self, ms: u32) {
        self.waited_ms += ms as u64;
    }
}
