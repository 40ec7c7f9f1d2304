use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::net::Layout;
use crate::pins::{Channel, PinTable};
use crate::{DEFAULT_CHANNELS, MAX_CHANNELS, MAX_LAYOUTS, MAX_NETS, MAX_NET_SIZE};

/// Configuration compiled into the binary.
pub const BUILTIN: &str = include_str!("builtin.toml");

/// Complete representation of a tester configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesterToml {
    /// Hardware and loop settings
    #[serde(default)]
    pub tester: TesterConfig,

    /// Pin label to expander channel table, shared by every layout
    #[serde(default)]
    pub pins: BTreeMap<String, Channel>,

    /// Layouts in selection order
    #[serde(rename = "layout", default)]
    pub layouts: Vec<Layout>,
}

/// Configuration for [tester] section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesterConfig {
    /// Number of channels on the expander
    #[serde(default = "default_channels")]
    pub channels: usize,

    /// Pause between two test cycles
    #[serde(default = "default_cycle_delay_ms")]
    pub cycle_delay_ms: u64,

    /// Splits a net label into two display lines
    #[serde(default = "default_label_separator")]
    pub label_separator: char,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            cycle_delay_ms: default_cycle_delay_ms(),
            label_separator: default_label_separator(),
        }
    }
}

fn default_channels() -> usize {
    DEFAULT_CHANNELS
}

fn default_cycle_delay_ms() -> u64 {
    100
}

fn default_label_separator() -> char {
    '|'
}

impl TesterToml {
    /// Parse and validate a configuration from string content
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// The configuration compiled into the binary
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::parse(BUILTIN)
    }

    pub fn pin_table(&self) -> PinTable {
        PinTable::new(self.pins.clone())
    }

    pub fn layout(&self, index: usize) -> Option<&Layout> {
        self.layouts.get(index)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.tester.cycle_delay_ms)
    }

    /// Check the structural limits. Pin labels are not checked against the
    /// table here; resolution reports those.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let channels = self.tester.channels;
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(ConfigError::ChannelCount {
                channels,
                max: MAX_CHANNELS,
            });
        }
        if self.layouts.is_empty() {
            return Err(ConfigError::NoLayouts);
        }
        if self.layouts.len() > MAX_LAYOUTS {
            return Err(ConfigError::TooManyLayouts {
                count: self.layouts.len(),
                max: MAX_LAYOUTS,
            });
        }

        for (label, channel) in &self.pins {
            if channel.index() >= self.tester.channels {
                return Err(ConfigError::ChannelOutOfRange {
                    label: label.clone(),
                    channel: *channel,
                    channels: self.tester.channels,
                });
            }
        }

        for layout in &self.layouts {
            if layout.nets.is_empty() {
                return Err(ConfigError::EmptyLayout {
                    layout: layout.name.clone(),
                });
            }
            if layout.nets.len() > MAX_NETS {
                return Err(ConfigError::TooManyNets {
                    layout: layout.name.clone(),
                    count: layout.nets.len(),
                    max: MAX_NETS,
                });
            }
            for net in &layout.nets {
                if net.pins.is_empty() {
                    return Err(ConfigError::EmptyNet {
                        layout: layout.name.clone(),
                        net: net.label.clone(),
                    });
                }
                if net.pins.len() > MAX_NET_SIZE {
                    return Err(ConfigError::TooManyPins {
                        layout: layout.name.clone(),
                        net: net.label.clone(),
                        count: net.pins.len(),
                        max: MAX_NET_SIZE,
                    });
                }
            }
        }

        Ok(())
    }
}
