//! Register-level driver for the Microchip MCP23017 16-channel I2C expander.
//!
//! Channels 0..=7 are port A, 8..=15 are port B. Registers are addressed in
//! the power-on `IOCON.BANK = 0` layout where A/B registers are interleaved.

use crate::error::ExpanderError;
use crate::expander::{Expander, Level, PinMode};
use crate::pins::Channel;

/// Address of the expander on the reference fixture (A2..A0 strapped high).
pub const DEFAULT_ADDRESS: u8 = 0x27;

pub const CHANNELS: usize = 16;

mod reg {
    pub const IODIRA: u8 = 0x00;
    pub const GPPUA: u8 = 0x0C;
    pub const GPIOA: u8 = 0x12;
    pub const OLATA: u8 = 0x14;
}

/// Byte-register access to a device on an I2C bus.
pub trait RegisterBus {
    fn read_register(&mut self, address: u8, register: u8) -> Result<u8, ExpanderError>;

    fn write_register(&mut self, address: u8, register: u8, value: u8)
        -> Result<(), ExpanderError>;
}

pub struct Mcp23017<B> {
    bus: B,
    address: u8,
}

impl<B: RegisterBus> Mcp23017<B> {
    pub fn new(bus: B) -> Self {
        Self::with_address(bus, DEFAULT_ADDRESS)
    }

    pub fn with_address(bus: B, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Register address for `base` (an A-port register) and the bit of
    /// `channel` within it.
    fn locate(&self, base: u8, channel: Channel) -> Result<(u8, u8), ExpanderError> {
        self.check_channel(channel)?;
        let port = channel.0 / 8;
        Ok((base + port, 1 << (channel.0 % 8)))
    }

    fn update_bit(&mut self, base: u8, channel: Channel, set: bool) -> Result<(), ExpanderError> {
        let (register, mask) = self.locate(base, channel)?;
        let value = self.bus.read_register(self.address, register)?;
        let updated = if set { value | mask } else { value & !mask };
        if updated != value {
            self.bus.write_register(self.address, register, updated)?;
        }
        Ok(())
    }

    fn read_bit(&mut self, base: u8, channel: Channel) -> Result<bool, ExpanderError> {
        let (register, mask) = self.locate(base, channel)?;
        Ok(self.bus.read_register(self.address, register)? & mask != 0)
    }
}

impl<B: RegisterBus> Expander for Mcp23017<B> {
    fn probe(&mut self) -> Result<(), ExpanderError> {
        self.bus
            .read_register(self.address, reg::IODIRA)
            .map(|_| ())
            .map_err(|e| {
                ExpanderError::NotDetected(format!("MCP23017 at 0x{:02X}: {e}", self.address))
            })
    }

    fn channel_count(&self) -> usize {
        CHANNELS
    }

    fn set_mode(&mut self, channel: Channel, mode: PinMode) -> Result<(), ExpanderError> {
        match mode {
            PinMode::Output => self.update_bit(reg::IODIRA, channel, false),
            PinMode::InputPullUp => {
                self.update_bit(reg::IODIRA, channel, true)?;
                self.update_bit(reg::GPPUA, channel, true)
            }
        }
    }

    fn mode(&mut self, channel: Channel) -> Result<PinMode, ExpanderError> {
        Ok(if self.read_bit(reg::IODIRA, channel)? {
            PinMode::InputPullUp
        } else {
            PinMode::Output
        })
    }

    fn write(&mut self, channel: Channel, level: Level) -> Result<(), ExpanderError> {
        self.update_bit(reg::OLATA, channel, level == Level::High)
    }

    fn read(&mut self, channel: Channel) -> Result<Level, ExpanderError> {
        Ok(if self.read_bit(reg::GPIOA, channel)? {
            Level::High
        } else {
            Level::Low
        })
    }
}
