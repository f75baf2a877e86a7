//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// logpipe - structured log ingestion service
#[derive(Parser, Debug)]
#[command(
    name = "logpipe",
    author,
    version,
    about = "Structured log ingestion service",
    long_about = "Accepts JSON log entries over HTTP, renders each one as a single line\n\
                  and appends it to every configured sink."
)]
pub struct Cli {
    /// Log output format (overrides [app].log_format)
    #[arg(long, value_enum, global = true, env = "LOGPIPE_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion service
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "logpipe.toml",
        env = "LOGPIPE_CONFIG"
    )]
    pub config_file: PathBuf,

    /// Override [app].log_level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOGPIPE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Override [server].port
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Override [server].metrics_port (0 = disabled)
    #[arg(long, env = "LOGPIPE_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "logpipe.toml", env = "LOGPIPE_CONFIG")]
    pub config_file: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
