//! Interface to whatever shows the tester's state to the operator.

use serde::Serialize;

use crate::net::ResolvedNets;

/// Indicators per display row.
pub const SLOTS_PER_ROW: usize = 2;

/// A net label split into at most two display lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetLabel {
    pub first: String,
    pub second: Option<String>,
}

impl NetLabel {
    /// Split `raw` at the first `separator`.
    pub fn parse(raw: &str, separator: char) -> Self {
        match raw.split_once(separator) {
            Some((first, second)) => Self {
                first: first.to_string(),
                second: Some(second.to_string()),
            },
            None => Self {
                first: raw.to_string(),
                second: None,
            },
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.first.as_str()).chain(self.second.as_deref())
    }
}

/// Grid position of a net's indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub row: usize,
    pub column: usize,
}

impl Slot {
    pub fn for_index(index: usize) -> Self {
        Self {
            row: index / SLOTS_PER_ROW,
            column: index % SLOTS_PER_ROW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetView {
    pub index: usize,
    pub label: NetLabel,
    pub slot: Slot,
}

/// What a presenter needs to draw a freshly activated layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutView {
    pub index: usize,
    pub name: String,
    pub nets: Vec<NetView>,
}

impl LayoutView {
    pub fn new(index: usize, nets: &ResolvedNets, separator: char) -> Self {
        Self {
            index,
            name: nets.layout.clone(),
            nets: nets
                .iter()
                .enumerate()
                .map(|(i, net)| NetView {
                    index: i,
                    label: NetLabel::parse(&net.label, separator),
                    slot: Slot::for_index(i),
                })
                .collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.nets.len().div_ceil(SLOTS_PER_ROW)
    }
}

pub trait Presenter {
    /// Redraw everything for a newly activated layout.
    fn draw_layout(&mut self, view: &LayoutView);

    /// Update the indicator of one net after its test turn.
    fn show_verdict(&mut self, net: usize, passed: bool);

    /// Show a fatal fault. Nothing else is drawn afterwards.
    fn halt(&mut self, message: &str);
}
