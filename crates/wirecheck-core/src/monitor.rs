//! The single-threaded poll loop tying selection, engine and display together.
//!
//! Each tick polls for a layout selection, switches if needed, runs one full
//! cycle, publishes the verdicts and then waits for the cycle delay. Layout
//! switches therefore land between cycles, never inside one.

use std::io;
use std::time::{Duration, Instant};

use log::{error, info};

use crate::config::TesterToml;
use crate::error::{ExpanderError, MonitorError};
use crate::expander::Expander;
use crate::presenter::Presenter;
use crate::selector::EngineState;

/// Banner shown when the expander does not answer at startup.
pub const NOT_FOUND_BANNER: &str = "EXPANDER NOT FOUND";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Layout(usize),
    Quit,
}

/// Source of operator selections, e.g. buttons or a keyboard.
pub trait SelectionInput {
    /// Wait up to `timeout` for a selection. A zero timeout only checks for
    /// one that is already pending.
    fn poll(&mut self, timeout: Duration) -> io::Result<Option<Selection>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Quit,
}

pub struct Monitor<'a> {
    state: EngineState,
    expander: &'a mut dyn Expander,
    presenter: &'a mut dyn Presenter,
    separator: char,
    delay: Duration,
    pending: Option<Selection>,
}

impl<'a> Monitor<'a> {
    /// Probe the expander, activate the first layout and draw it.
    ///
    /// A missing expander or a fault while activating the first layout is
    /// fatal: the presenter is told to halt and the error is returned.
    pub fn start(
        config: &TesterToml,
        expander: &'a mut dyn Expander,
        presenter: &'a mut dyn Presenter,
    ) -> Result<Self, ExpanderError> {
        if let Err(err) = expander.probe() {
            error!("{err}");
            presenter.halt(NOT_FOUND_BANNER);
            return Err(err);
        }
        info!("I/O expander found");

        let state = match EngineState::from_config(config, expander) {
            Ok(state) => state,
            Err(err) => {
                error!("Failed to activate layout: {err}");
                presenter.halt(&err.to_string());
                return Err(err);
            }
        };
        let separator = config.tester.label_separator;
        presenter.draw_layout(&state.layout_view(separator));

        Ok(Self {
            state,
            expander,
            presenter,
            separator,
            delay: config.cycle_delay(),
            pending: None,
        })
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Switch layouts and redraw. Same-index and out-of-range requests are
    /// ignored. An expander fault halts the presenter.
    pub fn select(&mut self, index: usize) -> Result<bool, ExpanderError> {
        let switched = match self.state.select(index, &mut *self.expander) {
            Ok(switched) => switched,
            Err(err) => {
                error!("Failed to activate layout #{}: {err}", index + 1);
                self.presenter.halt(&err.to_string());
                return Err(err);
            }
        };
        if switched {
            self.presenter
                .draw_layout(&self.state.layout_view(self.separator));
        }
        Ok(switched)
    }

    pub fn tick(&mut self, input: &mut dyn SelectionInput) -> Result<Tick, MonitorError> {
        let selection = match self.pending.take() {
            Some(selection) => Some(selection),
            None => input.poll(Duration::ZERO)?,
        };
        match selection {
            Some(Selection::Quit) => return Ok(Tick::Quit),
            Some(Selection::Layout(index)) => {
                self.select(index)?;
            }
            None => {}
        }

        let report = match self.state.run_cycle(&mut *self.expander) {
            Ok(report) => report,
            Err(err) => {
                error!("Test cycle aborted: {err}");
                self.presenter.halt(&err.to_string());
                return Err(err.into());
            }
        };
        for (index, passed) in report.verdicts().enumerate() {
            self.presenter.show_verdict(index, passed);
        }

        self.pending = self.wait(input)?;
        Ok(Tick::Continue)
    }

    /// Sit out the full cycle delay, collecting input. The first layout
    /// selection is kept; a quit request ends the wait early.
    fn wait(&self, input: &mut dyn SelectionInput) -> io::Result<Option<Selection>> {
        let deadline = Instant::now() + self.delay;
        let mut selection = None;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match input.poll(remaining)? {
                Some(Selection::Quit) => return Ok(Some(Selection::Quit)),
                Some(layout) => {
                    selection.get_or_insert(layout);
                }
                None => {}
            }
            if Instant::now() >= deadline {
                return Ok(selection);
            }
        }
    }

    /// Tick until the operator quits or `max_cycles` cycles have run.
    /// Returns the number of cycles run.
    pub fn run(
        &mut self,
        input: &mut dyn SelectionInput,
        max_cycles: Option<u64>,
    ) -> Result<u64, MonitorError> {
        while max_cycles.map_or(true, |max| self.state.cycles() < max) {
            if self.tick(input)? == Tick::Quit {
                break;
            }
        }
        Ok(self.state.cycles())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::bench::Bench;
    use crate::presenter::LayoutView;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Recorder {
        layouts: Vec<String>,
        verdicts: Vec<(usize, bool)>,
        halted: Option<String>,
    }

    impl Presenter for Recorder {
        fn draw_layout(&mut self, view: &LayoutView) {
            self.layouts.push(view.name.clone());
            self.verdicts.clear();
        }

        fn show_verdict(&mut self, net: usize, passed: bool) {
            self.verdicts.push((net, passed));
        }

        fn halt(&mut self, message: &str) {
            self.halted = Some(message.to_string());
        }
    }

    /// Hands out one scripted answer per poll, then nothing.
    struct Script(VecDeque<Option<Selection>>);

    impl SelectionInput for Script {
        fn poll(&mut self, _timeout: Duration) -> io::Result<Option<Selection>> {
            Ok(self.0.pop_front().flatten())
        }
    }

    fn config() -> TesterToml {
        let mut config = TesterToml::builtin().unwrap();
        config.tester.cycle_delay_ms = 0;
        config
    }

    #[test]
    fn test_missing_expander_halts() {
        let config = config();
        let mut bench = Bench::absent(16);
        let mut recorder = Recorder::default();

        let result = Monitor::start(&config, &mut bench, &mut recorder);

        assert!(matches!(result, Err(ExpanderError::NotDetected(_))));
        assert_eq!(recorder.halted.as_deref(), Some(NOT_FOUND_BANNER));
        assert!(recorder.layouts.is_empty());
    }

    #[test]
    fn test_cycles_publish_verdicts() {
        let config = config();
        let nets = crate::net::resolve(&config.layouts[0], &config.pin_table()).nets;
        let mut bench = Bench::golden(16, &nets).unwrap();
        let mut recorder = Recorder::default();

        let cycles = {
            let mut monitor = Monitor::start(&config, &mut bench, &mut recorder).unwrap();
            monitor.run(&mut Script(VecDeque::new()), Some(2)).unwrap()
        };

        assert_eq!(cycles, 2);
        assert_eq!(recorder.layouts, vec!["DEM w/ Power Header"]);
        assert_eq!(recorder.verdicts.len(), 8);
        assert!(recorder.verdicts.iter().all(|(_, passed)| *passed));
    }

    #[test]
    fn test_selection_switches_between_cycles() {
        let config = config();
        let mut bench = Bench::new(16);
        let mut recorder = Recorder::default();
        let mut input = Script(VecDeque::from([
            None,
            Some(Selection::Layout(2)),
            Some(Selection::Layout(2)),
            Some(Selection::Quit),
        ]));

        let mut monitor = Monitor::start(&config, &mut bench, &mut recorder).unwrap();
        assert_eq!(monitor.tick(&mut input).unwrap(), Tick::Continue);
        assert_eq!(monitor.state().active_index(), 0);

        // the selection arrives while waiting and applies on the next tick
        assert_eq!(monitor.tick(&mut input).unwrap(), Tick::Continue);
        assert_eq!(monitor.state().active_index(), 2);
        assert_eq!(monitor.state().last_report().map(|r| r.outcomes.len()), Some(2));

        // selecting the active layout again changes nothing
        assert_eq!(monitor.tick(&mut input).unwrap(), Tick::Continue);
        assert_eq!(monitor.state().active_index(), 2);

        assert_eq!(monitor.tick(&mut input).unwrap(), Tick::Quit);
        drop(monitor);

        assert_eq!(
            recorder.layouts,
            vec!["DEM w/ Power Header", "DEM w/ Pwr Hdr Tray State"]
        );
    }

    #[test]
    fn test_activation_fault_at_start_halts() {
        let config = config();
        // the built-in pin table reaches channel 15
        let mut bench = Bench::new(8);
        let mut recorder = Recorder::default();

        let result = Monitor::start(&config, &mut bench, &mut recorder);

        assert!(matches!(
            result,
            Err(ExpanderError::ChannelOutOfRange { count: 8, .. })
        ));
        assert_eq!(
            recorder.halted.as_deref(),
            Some("Channel 12 is out of range, the expander has 8 channels")
        );
        assert!(recorder.layouts.is_empty());
    }

    #[test]
    fn test_activation_fault_on_select_halts() {
        let config = TesterToml::parse(
            r#"
[pins]
"A" = 0
"B" = 1
"Z" = 15

[[layout]]
name = "Low"

[[layout.net]]
label = "A-B"
pins = ["A", "B"]

[[layout]]
name = "High"

[[layout.net]]
label = "Z"
pins = ["Z"]
"#,
        )
        .unwrap();
        let mut bench = Bench::new(8);
        let mut recorder = Recorder::default();

        let mut monitor = Monitor::start(&config, &mut bench, &mut recorder).unwrap();
        assert!(monitor.select(1).is_err());
        assert_eq!(monitor.state().active_index(), 0);
        drop(monitor);

        assert_eq!(recorder.layouts, vec!["Low"]);
        assert_eq!(
            recorder.halted.as_deref(),
            Some("Channel 15 is out of range, the expander has 8 channels")
        );
    }

    #[test]
    fn test_delay_is_not_cut_short_by_input() {
        let mut config = config();
        config.tester.cycle_delay_ms = 30;
        let mut bench = Bench::new(16);
        let mut recorder = Recorder::default();
        let mut input = Script(VecDeque::from([
            None,
            Some(Selection::Layout(1)),
            Some(Selection::Layout(2)),
        ]));

        let mut monitor = Monitor::start(&config, &mut bench, &mut recorder).unwrap();
        let started = Instant::now();
        assert_eq!(monitor.tick(&mut input).unwrap(), Tick::Continue);
        assert!(started.elapsed() >= Duration::from_millis(30));

        // the first selection made during the wait wins
        assert_eq!(monitor.tick(&mut input).unwrap(), Tick::Continue);
        assert_eq!(monitor.state().active_index(), 1);
    }

    #[test]
    fn test_quit_during_delay_wins_over_selection() {
        let mut config = config();
        config.tester.cycle_delay_ms = 30;
        let mut bench = Bench::new(16);
        let mut recorder = Recorder::default();
        let mut input = Script(VecDeque::from([
            None,
            Some(Selection::Layout(1)),
            Some(Selection::Quit),
        ]));

        let mut monitor = Monitor::start(&config, &mut bench, &mut recorder).unwrap();
        assert_eq!(monitor.tick(&mut input).unwrap(), Tick::Continue);
        assert_eq!(monitor.tick(&mut input).unwrap(), Tick::Quit);
        assert_eq!(monitor.state().active_index(), 0);
    }

    #[test]
    fn test_out_of_range_selection_is_ignored() {
        let config = config();
        let mut bench = Bench::new(16);
        let mut recorder = Recorder::default();

        let mut monitor = Monitor::start(&config, &mut bench, &mut recorder).unwrap();
        assert!(!monitor.select(7).unwrap());
        assert_eq!(monitor.state().active_index(), 0);
    }
}
