//! A simulated harness on a simulated expander.
//!
//! Channels joined by wires form groups. A channel reads low when any channel
//! of its group is an output latched low; otherwise the pull-ups win and it
//! reads high.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ExpanderError;
use crate::expander::{Expander, Level, PinMode};
use crate::net::ResolvedNets;
use crate::pins::Channel;

/// Bench description as read from a TOML file.
///
/// ```toml
/// present = true
///
/// [[wire]]
/// channels = [12, 7]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchToml {
    #[serde(default = "default_present")]
    pub present: bool,

    #[serde(rename = "wire", default)]
    pub wires: Vec<Wire>,
}

/// Channels joined by one conductor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    pub channels: Vec<Channel>,
}

fn default_present() -> bool {
    true
}

impl BenchToml {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse bench file: {e}"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bench file {}", path.display()))?;
        Self::parse(&content)
    }
}

#[derive(Debug, Clone)]
pub struct Bench {
    present: bool,
    modes: Vec<PinMode>,
    latches: Vec<Level>,
    /// Group id per channel; wired channels share an id.
    groups: Vec<usize>,
}

impl Bench {
    /// An unwired bench with every channel a pulled-up input.
    pub fn new(channels: usize) -> Self {
        Self {
            present: true,
            modes: vec![PinMode::InputPullUp; channels],
            latches: vec![Level::High; channels],
            groups: (0..channels).collect(),
        }
    }

    /// A bench whose expander does not answer.
    pub fn absent(channels: usize) -> Self {
        Self {
            present: false,
            ..Self::new(channels)
        }
    }

    /// A harness wired exactly as the nets declare.
    pub fn golden(channels: usize, nets: &ResolvedNets) -> Result<Self, ExpanderError> {
        let mut bench = Self::new(channels);
        for net in nets.iter() {
            let wire: Vec<Channel> = net.channels().collect();
            bench.wire(&wire)?;
        }
        Ok(bench)
    }

    pub fn from_toml(channels: usize, config: &BenchToml) -> Result<Self, ExpanderError> {
        let mut bench = Self::new(channels);
        bench.present = config.present;
        for wire in &config.wires {
            bench.wire(&wire.channels)?;
        }
        Ok(bench)
    }

    /// Join two channels with a conductor.
    pub fn connect(&mut self, a: Channel, b: Channel) -> Result<(), ExpanderError> {
        self.check_channel(a)?;
        self.check_channel(b)?;
        let (keep, merge) = (self.groups[a.index()], self.groups[b.index()]);
        if keep != merge {
            for group in self.groups.iter_mut().filter(|g| **g == merge) {
                *group = keep;
            }
        }
        Ok(())
    }

    /// Join every channel in `channels` to the first.
    pub fn wire(&mut self, channels: &[Channel]) -> Result<(), ExpanderError> {
        if let Some((first, rest)) = channels.split_first() {
            for channel in rest {
                self.connect(*first, *channel)?;
            }
        }
        Ok(())
    }

    /// Cut every conductor attached to `channel`, as if its wire broke.
    pub fn isolate(&mut self, channel: Channel) -> Result<(), ExpanderError> {
        self.check_channel(channel)?;
        let fresh = self.groups.len() + channel.index();
        self.groups[channel.index()] = fresh;
        Ok(())
    }

    pub fn is_connected(&self, a: Channel, b: Channel) -> bool {
        match (self.groups.get(a.index()), self.groups.get(b.index())) {
            (Some(ga), Some(gb)) => ga == gb,
            _ => false,
        }
    }

    fn ensure_present(&self) -> Result<(), ExpanderError> {
        if self.present {
            Ok(())
        } else {
            Err(ExpanderError::NotDetected(
                "simulated expander is not connected".to_string(),
            ))
        }
    }
}

impl Expander for Bench {
    fn probe(&mut self) -> Result<(), ExpanderError> {
        self.ensure_present()
    }

    fn channel_count(&self) -> usize {
        self.modes.len()
    }

    fn set_mode(&mut self, channel: Channel, mode: PinMode) -> Result<(), ExpanderError> {
        self.ensure_present()?;
        self.check_channel(channel)?;
        self.modes[channel.index()] = mode;
        Ok(())
    }

    fn mode(&mut self, channel: Channel) -> Result<PinMode, ExpanderError> {
        self.ensure_present()?;
        self.check_channel(channel)?;
        Ok(self.modes[channel.index()])
    }

    fn write(&mut self, channel: Channel, level: Level) -> Result<(), ExpanderError> {
        self.ensure_present()?;
        self.check_channel(channel)?;
        self.latches[channel.index()] = level;
        Ok(())
    }

    fn read(&mut self, channel: Channel) -> Result<Level, ExpanderError> {
        self.ensure_present()?;
        self.check_channel(channel)?;
        let group = self.groups[channel.index()];
        let pulled_low = (0..self.modes.len()).any(|i| {
            self.groups[i] == group
                && self.modes[i] == PinMode::Output
                && self.latches[i] == Level::Low
        });
        Ok(if pulled_low { Level::Low } else { Level::High })
    }
}
