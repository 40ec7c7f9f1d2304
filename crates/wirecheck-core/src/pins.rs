use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A numbered digital I/O line on the expander.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub u8);

impl Channel {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for Channel {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only mapping from connector/pin labels to expander channels.
///
/// Shared by every layout of a tester. Built once from configuration and never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinTable {
    labels: BTreeMap<String, Channel>,
}

impl PinTable {
    pub fn new(labels: BTreeMap<String, Channel>) -> Self {
        Self { labels }
    }

    /// Look up a label exactly as given. Callers trim before lookup.
    pub fn lookup(&self, label: &str) -> Option<Channel> {
        self.labels.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Channel)> {
        self.labels.iter().map(|(label, channel)| (label.as_str(), *channel))
    }
}

impl<S: Into<String>> FromIterator<(S, Channel)> for PinTable {
    fn from_iter<I: IntoIterator<Item = (S, Channel)>>(iter: I) -> Self {
        Self {
            labels: iter
                .into_iter()
                .map(|(label, channel)| (label.into(), channel))
                .collect(),
        }
    }
}
