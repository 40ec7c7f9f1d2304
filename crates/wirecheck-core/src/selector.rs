//! Active layout state.
//!
//! Everything that changes at runtime lives in one [`EngineState`]: which
//! layout is active, its resolved nets, and the verdicts of the last cycle.
//! The poll loop owns it, so a layout switch is only ever seen between two
//! whole cycles.

use log::info;

use crate::config::TesterToml;
use crate::diagnostics::Diagnostic;
use crate::engine::{self, CycleReport};
use crate::error::ExpanderError;
use crate::expander::Expander;
use crate::net::{self, Layout, ResolvedNets};
use crate::pins::PinTable;
use crate::presenter::LayoutView;

#[derive(Debug, Clone)]
pub struct EngineState {
    layouts: Vec<Layout>,
    pins: PinTable,
    active: usize,
    nets: ResolvedNets,
    diagnostics: Vec<Diagnostic>,
    last_report: Option<CycleReport>,
    cycles: u64,
}

impl EngineState {
    /// Activate layout 0. `layouts` must not be empty.
    pub fn new(
        layouts: Vec<Layout>,
        pins: PinTable,
        expander: &mut dyn Expander,
    ) -> Result<Self, ExpanderError> {
        let resolution = match layouts.first() {
            Some(layout) => net::activate(layout, &pins, expander)?,
            None => Default::default(),
        };

        Ok(Self {
            layouts,
            pins,
            active: 0,
            nets: resolution.nets,
            diagnostics: resolution.diagnostics,
            last_report: None,
            cycles: 0,
        })
    }

    pub fn from_config(
        config: &TesterToml,
        expander: &mut dyn Expander,
    ) -> Result<Self, ExpanderError> {
        Self::new(config.layouts.clone(), config.pin_table(), expander)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn nets(&self) -> &ResolvedNets {
        &self.nets
    }

    /// Configuration problems found when the active layout was resolved.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Verdicts of the most recent cycle on the active layout.
    pub fn last_report(&self) -> Option<&CycleReport> {
        self.last_report.as_ref()
    }

    /// Cycles completed since startup, across layouts.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Switch to layout `index`.
    ///
    /// Returns `Ok(false)` without touching anything when `index` is already
    /// active or out of range. A switch re-resolves the nets and discards the
    /// previous verdicts.
    pub fn select(
        &mut self,
        index: usize,
        expander: &mut dyn Expander,
    ) -> Result<bool, ExpanderError> {
        if index == self.active {
            return Ok(false);
        }
        let Some(layout) = self.layouts.get(index) else {
            return Ok(false);
        };

        let resolution = net::activate(layout, &self.pins, expander)?;
        self.active = index;
        self.nets = resolution.nets;
        self.diagnostics = resolution.diagnostics;
        self.last_report = None;

        info!("Switched to layout #{} ('{}')", index + 1, layout.name);
        Ok(true)
    }

    /// Run one full test cycle over the active layout and keep its verdicts.
    pub fn run_cycle(&mut self, expander: &mut dyn Expander) -> Result<&CycleReport, ExpanderError> {
        let mut report = engine::run_cycle(&self.nets, expander)?;
        self.cycles += 1;
        report.cycle = self.cycles;
        let report: &CycleReport = self.last_report.insert(report);
        Ok(report)
    }

    pub fn layout_view(&self, separator: char) -> LayoutView {
        LayoutView::new(self.active, &self.nets, separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::bench::Bench;
    use crate::expander::PinMode;
    use crate::pins::Channel;

    fn state(bench: &mut Bench) -> EngineState {
        let config = TesterToml::builtin().unwrap();
        EngineState::from_config(&config, bench).unwrap()
    }

    #[test]
    fn test_starts_on_first_layout() {
        let mut bench = Bench::new(16);
        let state = state(&mut bench);

        assert_eq!(state.active_index(), 0);
        assert_eq!(state.nets().layout, "DEM w/ Power Header");
        assert_eq!(state.nets().len(), 4);
        assert!(state.last_report().is_none());
        assert!(state.diagnostics().is_empty());
    }

    #[test]
    fn test_same_index_is_noop() {
        let mut bench = Bench::new(16);
        let mut state = state(&mut bench);
        state.run_cycle(&mut bench).unwrap();
        let before_nets = state.nets().clone();
        let before_report = state.last_report().cloned();

        assert!(!state.select(0, &mut bench).unwrap());

        assert_eq!(state.nets(), &before_nets);
        assert_eq!(state.last_report().cloned(), before_report);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut bench = Bench::new(16);
        let mut state = state(&mut bench);

        assert!(!state.select(3, &mut bench).unwrap());
        assert!(!state.select(usize::MAX, &mut bench).unwrap());
        assert_eq!(state.active_index(), 0);
    }

    #[test]
    fn test_switch_resolves_new_layout_and_drops_verdicts() {
        let mut bench = Bench::new(16);
        let mut state = state(&mut bench);
        state.run_cycle(&mut bench).unwrap();
        assert!(state.last_report().is_some());

        // leave a channel of the new layout driven to check it gets released
        bench.set_mode(Channel(6), PinMode::Output).unwrap();

        assert!(state.select(1, &mut bench).unwrap());

        assert_eq!(state.active_index(), 1);
        assert_eq!(state.nets().layout, "Plain DEM");
        assert_eq!(state.nets().len(), 3);
        assert!(state.last_report().is_none());
        assert_eq!(bench.mode(Channel(6)).unwrap(), PinMode::InputPullUp);

        let report = state.run_cycle(&mut bench).unwrap();
        assert_eq!(report.layout, "Plain DEM");
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.cycle, 2);
        assert_eq!(state.cycles(), 2);
    }

    #[test]
    fn test_golden_bench_passes_each_layout() {
        let config = TesterToml::builtin().unwrap();
        for index in 0..config.layouts.len() {
            let mut bench = Bench::new(16);
            let mut state = EngineState::from_config(&config, &mut bench).unwrap();
            state.select(index, &mut bench).unwrap();
            let mut bench = Bench::golden(16, state.nets()).unwrap();

            let report = state.run_cycle(&mut bench).unwrap();
            assert!(report.all_passed(), "layout {index}: {report:?}");
        }
    }

    #[test]
    fn test_layout_view_uses_separator() {
        let mut bench = Bench::new(16);
        let state = state(&mut bench);
        let view = state.layout_view('|');

        assert_eq!(view.name, "DEM w/ Power Header");
        assert_eq!(view.nets[1].label.first, "1-9-CN1");
        assert_eq!(view.nets[1].label.second.as_deref(), Some("12V"));
    }
}
