//! # logpipe CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - configuration loading and validation
//! - the ingestion service with graceful shutdown

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;

use cli::{Cli, Commands};
use commands::{run_service, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run(args) => run_service(args, cli.log_format).await,
        Commands::Validate(args) => {
            observability::init_with_config(ObservabilityConfig {
                log_format: cli.log_format.map(Into::into).unwrap_or_default(),
                ..Default::default()
            })?;
            run_validate(args)
        }
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
