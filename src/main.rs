mod cli;
mod commands;
mod util;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing::Level;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = babytrack::config::load_config()?;

    match cli.command {
        Command::Baby { action } => commands::baby(action, &config),

        Command::Progress { action } => commands::progress(action, &config),

        Command::Insights {
            baby_id,
            timeframe,
            json,
        } => commands::insights(baby_id, timeframe.as_deref(), json, &config),

        Command::Score { baby, record, now } => {
            commands::score(&baby, &record, now.as_deref(), &config)
        }

        Command::Report { baby_id, timeframe } => {
            commands::report(baby_id, timeframe.as_deref(), &config)
        }

        Command::Reference { output } => commands::reference(output.as_deref(), &config),

        Command::Paths => {
            commands::show_paths();
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
