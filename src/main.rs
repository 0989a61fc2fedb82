//! Signal trader CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use trading_config::load_config;
use trading_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    let level = cli.log_level.map_or(config.logging.level.as_str(), |l| l.as_str());
    let json = cli.json_logs || config.logging.is_json();
    let _guard = setup_logging(level, json, config.logging.file.as_deref());

    match cli.command {
        Commands::Paper(args) => cli::commands::paper::run(args, config).await,
        Commands::Train(args) => cli::commands::train::run(args, config).await,
        Commands::Signal(args) => cli::commands::signal::run(args, config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&config).await,
    }
}
