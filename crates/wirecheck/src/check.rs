use anyhow::Result;
use clap::Args;
use colored::Colorize;
use wirecheck_core::net::resolve;

use crate::setup::ConfigArgs;

#[derive(Args, Debug, Default, Clone)]
#[command(about = "Check that every pin label of every layout resolves")]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let config = args.config.load()?;
    let table = config.pin_table();
    let mut problems = 0;

    for (index, layout) in config.layouts.iter().enumerate() {
        let resolution = resolve(layout, &table);
        let channels = resolution.nets.channels().count();

        if resolution.diagnostics.is_empty() {
            println!(
                "{} #{} {} ({} nets, {} channels)",
                "✓".green(),
                index + 1,
                layout.name.bold().green(),
                layout.net_count(),
                channels
            );
            continue;
        }

        println!("{} #{} {}", "✗".red(), index + 1, layout.name.bold().red());
        for diag in &resolution.diagnostics {
            let line = diag.to_string();
            if diag.is_error() {
                println!("  {}", line.red());
            } else {
                println!("  {}", line.yellow());
            }
        }
        problems += resolution.diagnostics.len();
    }

    if problems > 0 {
        anyhow::bail!("Configuration check found {problems} problem(s)");
    }

    Ok(())
}
