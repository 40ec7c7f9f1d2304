//! The digital I/O expander the tester drives.

pub mod bench;
pub mod mcp23017;

use std::fmt;

use crate::error::ExpanderError;
use crate::pins::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The level a net's driver is pulled to during its test turn.
    pub const ACTIVE: Level = Level::Low;

    pub fn is_active(self) -> bool {
        self == Self::ACTIVE
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "LOW"),
            Level::High => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    Output,
    /// High-impedance input biased high by the expander's pull-up. This is
    /// the safe resting state of every channel.
    InputPullUp,
}

/// Raw channel primitives of an I/O expander.
///
/// All calls are synchronous. Errors are not retried by the engine.
pub trait Expander {
    /// Check that the expander is present and answering.
    fn probe(&mut self) -> Result<(), ExpanderError>;

    fn channel_count(&self) -> usize;

    fn set_mode(&mut self, channel: Channel, mode: PinMode) -> Result<(), ExpanderError>;

    fn mode(&mut self, channel: Channel) -> Result<PinMode, ExpanderError>;

    fn write(&mut self, channel: Channel, level: Level) -> Result<(), ExpanderError>;

    fn read(&mut self, channel: Channel) -> Result<Level, ExpanderError>;

    /// Fail with [`ExpanderError::ChannelOutOfRange`] unless `channel` exists.
    fn check_channel(&self, channel: Channel) -> Result<(), ExpanderError> {
        if channel.index() < self.channel_count() {
            Ok(())
        } else {
            Err(ExpanderError::ChannelOutOfRange {
                channel,
                count: self.channel_count(),
            })
        }
    }
}

impl<E: Expander + ?Sized> Expander for Box<E> {
    fn probe(&mut self) -> Result<(), ExpanderError> {
        (**self).probe()
    }

    fn channel_count(&self) -> usize {
        (**self).channel_count()
    }

    fn set_mode(&mut self, channel: Channel, mode: PinMode) -> Result<(), ExpanderError> {
        (**self).set_mode(channel, mode)
    }

    fn mode(&mut self, channel: Channel) -> Result<PinMode, ExpanderError> {
        (**self).mode(channel)
    }

    fn write(&mut self, channel: Channel, level: Level) -> Result<(), ExpanderError> {
        (**self).write(channel, level)
    }

    fn read(&mut self, channel: Channel) -> Result<Level, ExpanderError> {
        (**self).read(channel)
    }
}
