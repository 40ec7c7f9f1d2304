//! Arguments and loading shared by the subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::debug;
use wirecheck_core::expander::bench::{Bench, BenchToml};
use wirecheck_core::net::resolve;
use wirecheck_core::TesterToml;

#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Tester configuration file. When omitted, the built-in DEM fixture
    /// configuration is used.
    #[arg(short = 'c', long = "config", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<TesterToml> {
        match &self.config {
            Some(path) => {
                debug!("Loading tester configuration from {}", path.display());
                TesterToml::from_file(path)
            }
            None => TesterToml::builtin().context("Built-in configuration is invalid"),
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct BenchArgs {
    /// Wiring of the simulated bench. When omitted, the bench is wired exactly
    /// as the starting layout declares.
    #[arg(short = 'b', long = "bench", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub bench: Option<PathBuf>,
}

impl BenchArgs {
    pub fn build(&self, config: &TesterToml, layout: usize) -> Result<Bench> {
        let channels = config.tester.channels;
        match &self.bench {
            Some(path) => {
                let bench = BenchToml::from_file(path)?;
                Ok(Bench::from_toml(channels, &bench)?)
            }
            None => {
                let layout = config
                    .layout(layout)
                    .with_context(|| format!("No layout #{}", layout + 1))?;
                let nets = resolve(layout, &config.pin_table()).nets;
                Ok(Bench::golden(channels, &nets)?)
            }
        }
    }
}

/// Turn a 1-based layout number from the command line into an index.
pub fn layout_index(config: &TesterToml, number: usize) -> Result<usize> {
    if number == 0 || number > config.layouts.len() {
        anyhow::bail!(
            "Layout #{number} does not exist, the configuration has {} layouts",
            config.layouts.len()
        );
    }
    Ok(number - 1)
}
