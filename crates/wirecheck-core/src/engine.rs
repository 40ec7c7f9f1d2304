//! The net test engine.
//!
//! Nets are tested strictly one after another. During a net's turn its driver
//! is the only output on the whole layout, so any other net's driver reading
//! low can only be explained by a short between the two.

use std::fmt;

use log::{debug, warn};
use serde::Serialize;

use crate::error::ExpanderError;
use crate::expander::{Expander, Level, PinMode};
use crate::net::ResolvedNets;
use crate::pins::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestVerdict {
    pub continuity: bool,
    pub isolation: bool,
}

impl TestVerdict {
    pub fn passed(&self) -> bool {
        self.continuity && self.isolation
    }
}

/// Why a net failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A pin of the net did not follow the driver low: a broken wire.
    ContinuityOpen { channel: Channel, label: String },

    /// Another net's driver read low while this net was driven.
    ShortTo {
        net: usize,
        label: String,
        channel: Channel,
    },

    /// The net has no resolved channels and cannot be driven.
    NoChannels,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::ContinuityOpen { channel, label } => write!(
                f,
                "Continuity test failed: pin {label} (channel {channel}) did not read LOW"
            ),
            Finding::ShortTo {
                net,
                label,
                channel,
            } => write!(
                f,
                "Short detected: net {net} ('{label}') driver channel {channel} read LOW"
            ),
            Finding::NoChannels => write!(f, "Net has no resolved channels to drive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetOutcome {
    pub index: usize,
    pub label: String,
    pub verdict: TestVerdict,
    pub findings: Vec<Finding>,
}

impl NetOutcome {
    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }
}

/// Verdicts for every net of the active layout from one full cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub layout: String,
    /// Cycle number since startup, counted by [`crate::EngineState`]. Zero
    /// for a cycle run directly through [`run_cycle`].
    pub cycle: u64,
    pub outcomes: Vec<NetOutcome>,
}

impl CycleReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(NetOutcome::passed)
    }

    pub fn verdicts(&self) -> impl Iterator<Item = bool> + '_ {
        self.outcomes.iter().map(NetOutcome::passed)
    }
}

/// Run one full pass over every net, in declaration order.
///
/// The cycle always completes all nets; an expander error aborts it.
pub fn run_cycle(
    nets: &ResolvedNets,
    expander: &mut dyn Expander,
) -> Result<CycleReport, ExpanderError> {
    let mut outcomes = Vec::with_capacity(nets.len());
    for index in 0..nets.len() {
        ensure_released(nets, expander)?;
        let outcome = test_net(nets, index, expander)?;
        if !outcome.passed() {
            log_failure(&outcome);
        }
        outcomes.push(outcome);
    }

    Ok(CycleReport {
        layout: nets.layout.clone(),
        cycle: 0,
        outcomes,
    })
}

/// Drive net `index` and check continuity and isolation.
///
/// The driver is returned to pull-up input mode before this returns.
pub fn test_net(
    nets: &ResolvedNets,
    index: usize,
    expander: &mut dyn Expander,
) -> Result<NetOutcome, ExpanderError> {
    let net = &nets.nets[index];
    let Some(driver) = net.driver() else {
        return Ok(NetOutcome {
            index,
            label: net.label.clone(),
            verdict: TestVerdict {
                continuity: false,
                isolation: true,
            },
            findings: vec![Finding::NoChannels],
        });
    };

    debug!("Driving net {index} ('{}') on channel {}", net.label, driver.channel);
    expander.set_mode(driver.channel, PinMode::Output)?;
    expander.write(driver.channel, Level::ACTIVE)?;

    let mut findings = Vec::new();

    let mut continuity = true;
    for pin in net.followers() {
        if !expander.read(pin.channel)?.is_active() {
            continuity = false;
            findings.push(Finding::ContinuityOpen {
                channel: pin.channel,
                label: pin.label.clone(),
            });
        }
    }

    let mut isolation = true;
    for (other, other_net) in nets.iter().enumerate() {
        if other == index {
            continue;
        }
        let Some(other_driver) = other_net.driver() else {
            continue;
        };
        if expander.read(other_driver.channel)?.is_active() {
            isolation = false;
            findings.push(Finding::ShortTo {
                net: other,
                label: other_net.label.clone(),
                channel: other_driver.channel,
            });
        }
    }

    expander.set_mode(driver.channel, PinMode::InputPullUp)?;

    Ok(NetOutcome {
        index,
        label: net.label.clone(),
        verdict: TestVerdict {
            continuity,
            isolation,
        },
        findings,
    })
}

/// Every channel of the layout must be an input before the next drive step.
/// Any channel still in output mode is put back and reported.
fn ensure_released(nets: &ResolvedNets, expander: &mut dyn Expander) -> Result<(), ExpanderError> {
    for channel in nets.channels() {
        if expander.mode(channel)? != PinMode::InputPullUp {
            warn!("Channel {channel} was left in output mode, releasing it");
            expander.set_mode(channel, PinMode::InputPullUp)?;
        }
    }
    Ok(())
}

fn log_failure(outcome: &NetOutcome) {
    warn!("Net {} ('{}') failed", outcome.index, outcome.label);
    for finding in &outcome.findings {
        warn!("  - {finding}");
    }
}
