//! Net model and test engine for continuity/short testers.
//!
//! A tester is described declaratively: a table mapping human-readable pin
//! labels to expander channels, and a list of layouts, each an ordered list of
//! nets. The active layout is resolved into channel lists and the engine then
//! walks the nets one at a time, driving the first channel of a net low and
//! checking that the rest of the net follows (continuity) while no other net
//! does (isolation).

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod expander;
pub mod monitor;
pub mod net;
pub mod pins;
pub mod presenter;
pub mod selector;

pub use config::{TesterConfig, TesterToml};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use engine::{run_cycle, CycleReport, Finding, NetOutcome, TestVerdict};
pub use error::{ConfigError, ExpanderError, MonitorError};
pub use expander::{Expander, Level, PinMode};
pub use monitor::{Monitor, Selection, SelectionInput, Tick};
pub use net::{Layout, NetSpec, Pin, Resolution, ResolvedNet, ResolvedNets};
pub use pins::{Channel, PinTable};
pub use presenter::{LayoutView, NetLabel, NetView, Presenter, Slot};
pub use selector::EngineState;

/// Maximum number of pin labels a single net may declare.
pub const MAX_NET_SIZE: usize = 7;

/// Maximum number of nets in a layout (one indicator slot each).
pub const MAX_NETS: usize = 8;

/// Maximum number of layouts; one per selection key `1`..`9`.
pub const MAX_LAYOUTS: usize = 9;

/// Upper bound on the expander channel count; a channel number is one byte.
pub const MAX_CHANNELS: usize = u8::MAX as usize + 1;

/// Channel count of the MCP23017, the expander the built-in pin table targets.
pub const DEFAULT_CHANNELS: usize = 16;
