use std::io;

use thiserror::Error;

use crate::pins::Channel;

/// Problems with a tester configuration document.
///
/// These are raised when the configuration is loaded. Unknown pin labels are
/// not among them: those are reported per layout when it is resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse tester configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Expander channel count must be between 1 and {max}, got {channels}")]
    ChannelCount { channels: usize, max: usize },

    #[error("Configuration declares no layouts")]
    NoLayouts,

    #[error("Configuration declares {count} layouts, at most {max} are supported")]
    TooManyLayouts { count: usize, max: usize },

    #[error("Layout '{layout}' declares no nets")]
    EmptyLayout { layout: String },

    #[error("Layout '{layout}' declares {count} nets, at most {max} are supported")]
    TooManyNets {
        layout: String,
        count: usize,
        max: usize,
    },

    #[error("Net '{net}' in layout '{layout}' declares no pins")]
    EmptyNet { layout: String, net: String },

    #[error("Net '{net}' in layout '{layout}' declares {count} pins, at most {max} are supported")]
    TooManyPins {
        layout: String,
        net: String,
        count: usize,
        max: usize,
    },

    #[error("Pin '{label}' maps to channel {channel}, but the expander has {channels} channels")]
    ChannelOutOfRange {
        label: String,
        channel: Channel,
        channels: usize,
    },
}

/// Failures reported by an expander driver.
///
/// None of these are retried. A missing expander at startup halts the tester,
/// and a fault during a cycle aborts it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpanderError {
    #[error("I/O expander not detected: {0}")]
    NotDetected(String),

    #[error("Channel {channel} is out of range, the expander has {count} channels")]
    ChannelOutOfRange { channel: Channel, count: usize },

    #[error("Bus fault: {0}")]
    Bus(String),
}

/// Errors that stop the poll loop.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Expander(#[from] ExpanderError),

    #[error("Failed to read selection input: {0}")]
    Input(#[from] io::Error),
}
