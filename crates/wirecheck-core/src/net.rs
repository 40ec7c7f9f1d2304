//! Declarative nets and their resolution into expander channels.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::error::ExpanderError;
use crate::expander::{Expander, PinMode};
use crate::pins::{Channel, PinTable};

/// A net as declared in configuration: a display label and the pin labels
/// that should be electrically continuous. The first pin is the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetSpec {
    pub label: String,
    pub pins: Vec<String>,
}

impl NetSpec {
    pub fn new<S: Into<String>>(label: impl Into<String>, pins: impl IntoIterator<Item = S>) -> Self {
        Self {
            label: label.into(),
            pins: pins.into_iter().map(Into::into).collect(),
        }
    }
}

/// A named, complete declaration of the nets of one board or harness variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,

    #[serde(rename = "net", default)]
    pub nets: Vec<NetSpec>,
}

impl Layout {
    pub fn new(name: impl Into<String>, nets: Vec<NetSpec>) -> Self {
        Self {
            name: name.into(),
            nets,
        }
    }

    pub fn net_count(&self) -> usize {
        self.nets.len()
    }
}

/// A pin of a resolved net, keeping the label it was declared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub label: String,
    pub channel: Channel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNet {
    pub label: String,
    pub pins: Vec<Pin>,
}

impl ResolvedNet {
    /// The channel driven low during this net's test turn.
    pub fn driver(&self) -> Option<&Pin> {
        self.pins.first()
    }

    /// Every pin after the driver; these must follow it for continuity.
    pub fn followers(&self) -> &[Pin] {
        self.pins.get(1..).unwrap_or_default()
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.pins.iter().map(|pin| pin.channel)
    }
}

/// The nets of the active layout with every label resolved to a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNets {
    pub layout: String,
    pub nets: Vec<ResolvedNet>,
}

impl ResolvedNets {
    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResolvedNet> {
        self.nets.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedNet> {
        self.nets.iter()
    }

    /// Every channel of every net, in declaration order.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.nets.iter().flat_map(ResolvedNet::channels)
    }

    /// Put every channel of the layout into pull-up input mode so nothing is
    /// left floating or driven before the first cycle.
    pub fn release(&self, expander: &mut dyn Expander) -> Result<(), ExpanderError> {
        for channel in self.channels() {
            expander.set_mode(channel, PinMode::InputPullUp)?;
        }
        debug!("Released {} channels of layout '{}'", self.channels().count(), self.layout);
        Ok(())
    }
}

/// Resolved nets plus the configuration problems found on the way.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub nets: ResolvedNets,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Resolve a layout's pin labels through the pin table.
///
/// Labels are trimmed before lookup. An unknown label is skipped and reported;
/// the rest of the net still resolves.
pub fn resolve(layout: &Layout, table: &PinTable) -> Resolution {
    let mut diagnostics = Vec::new();

    let nets = layout
        .nets
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let mut pins = Vec::with_capacity(spec.pins.len());
            for raw in &spec.pins {
                let label = raw.trim();
                match table.lookup(label) {
                    Some(channel) => pins.push(Pin {
                        label: label.to_string(),
                        channel,
                    }),
                    None => {
                        warn!("Unknown pin label '{label}' in net '{}'", spec.label);
                        diagnostics.push(Diagnostic::unknown_pin_label(
                            &layout.name,
                            index,
                            &spec.label,
                            label,
                        ));
                    }
                }
            }

            if pins.is_empty() {
                warn!("Net '{}' has no resolvable pins", spec.label);
                diagnostics.push(Diagnostic::empty_net(&layout.name, index, &spec.label));
            }

            ResolvedNet {
                label: spec.label.clone(),
                pins,
            }
        })
        .collect();

    Resolution {
        nets: ResolvedNets {
            layout: layout.name.clone(),
            nets,
        },
        diagnostics,
    }
}

/// Resolve a layout and release all of its channels on the expander.
pub fn activate(
    layout: &Layout,
    table: &PinTable,
    expander: &mut dyn Expander,
) -> Result<Resolution, ExpanderError> {
    let resolution = resolve(layout, table);
    resolution.nets.release(expander)?;
    Ok(resolution)
}
