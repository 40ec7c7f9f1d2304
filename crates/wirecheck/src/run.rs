use std::io;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use log::info;
use wirecheck_core::{Monitor, MonitorError};

use crate::setup::{layout_index, BenchArgs, ConfigArgs};
use crate::terminal::{wait_for_quit, Keyboard, TerminalGuard, TerminalPresenter};

#[derive(Args, Debug, Clone)]
#[command(about = "Continuously test the active layout until quit")]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub bench: BenchArgs,

    /// Layout to start on, numbered from 1
    #[arg(short = 'l', long = "layout", default_value_t = 1)]
    pub layout: usize,

    /// Stop after this many cycles instead of running until quit
    #[arg(short = 'n', long = "cycles")]
    pub cycles: Option<u64>,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let config = args.config.load()?;
    let index = layout_index(&config, args.layout)?;
    let mut bench = args.bench.build(&config, index)?;

    let guard = TerminalGuard::enter()?;
    let mut presenter = TerminalPresenter::new(io::stdout());
    let mut keyboard = Keyboard;

    let mut monitor = match Monitor::start(&config, &mut bench, &mut presenter) {
        Ok(monitor) => monitor,
        Err(err) => {
            // The expander is required; stay on the error banner until quit.
            wait_for_quit(&mut keyboard)?;
            drop(guard);
            return Err(err.into());
        }
    };
    if let Err(err) = monitor.select(index) {
        wait_for_quit(&mut keyboard)?;
        drop(monitor);
        drop(guard);
        return Err(err.into());
    }

    let outcome = monitor.run(&mut keyboard, args.cycles);
    if let Err(MonitorError::Expander(_)) = &outcome {
        wait_for_quit(&mut keyboard)?;
    }
    let summary = monitor.state().last_report().cloned();
    drop(monitor);
    drop(guard);

    let cycles = outcome?;
    info!("Stopped after {cycles} cycles");

    if let Some(report) = summary {
        let line = format!(
            "{}: {} passed, {} failed after {} cycles",
            report.layout,
            report.passed(),
            report.failed(),
            cycles
        );
        if report.all_passed() {
            println!("{} {}", "✓".green(), line);
        } else {
            println!("{} {}", "✗".red(), line);
        }
    }

    Ok(())
}
