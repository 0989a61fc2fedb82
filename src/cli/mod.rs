//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "signal-trader")]
#[command(author, version, about = "Model-driven signal generation and position lifecycle engine")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TRADING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configured one
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay historical bars through the engine against the paper broker
    Paper(PaperArgs),
    /// Train model weights from historical bars
    Train(TrainArgs),
    /// Evaluate the latest bar and print the decision
    Signal(SignalArgs),
    /// Validate configuration and print the effective settings
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct PaperArgs {
    /// Price history (CSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Bars used as warmup history; the rest are replayed as quotes
    #[arg(long)]
    pub warmup: Option<usize>,

    /// Delay between replayed quotes in milliseconds
    #[arg(long, default_value = "0")]
    pub tick_delay_ms: u64,

    /// Model weights, overrides the configured path
    #[arg(short, long)]
    pub weights: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,
}

#[derive(clap::Args)]
pub struct TrainArgs {
    /// Price history (CSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Where to write the weights, overrides the configured path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Training epochs, overrides the configured value
    #[arg(long)]
    pub epochs: Option<usize>,
}

#[derive(clap::Args)]
pub struct SignalArgs {
    /// Price history (CSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Model weights, overrides the configured path
    #[arg(short, long)]
    pub weights: Option<PathBuf>,
}
