use clap::{Parser, Subcommand};

mod check;
mod layouts;
mod run;
mod setup;
mod terminal;

#[derive(Parser)]
#[command(name = "wirecheck")]
#[command(about = "Continuity and short tester for wiring harnesses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive test loop
    #[command(alias = "r")]
    Run(run::RunArgs),

    /// Run a fixed number of test cycles and report the verdicts
    #[command(alias = "t")]
    Test(test::TestArgs),

    /// Resolve every layout and report unknown pin labels
    Check(check::CheckArgs),

    /// List the configured layouts
    #[command(alias = "ls")]
    Layouts(layouts::LayoutsArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run::execute(args),
        Commands::Test(args) => test::execute(args),
        Commands::Check(args) => check::execute(args),
        Commands::Layouts(args) => layouts::execute(args),
    }
}
