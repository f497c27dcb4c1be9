mod cli;
mod paths;
mod run;
mod settings;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Still(still)) => run::run_still(&cli.run, still),
        Some(Command::Config) => run::print_config(&cli.run),
        Some(Command::Paths) => run::print_paths(),
        None => run::run_window(&cli.run),
    }
}
