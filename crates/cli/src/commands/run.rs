//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::Settings;
use observability::ObservabilityConfig;
use service::HttpServe;
use tracing::info;

use crate::cli::{LogFormat, RunArgs};

/// Execute the `run` command
pub async fn run_service(args: &RunArgs, log_format: Option<LogFormat>) -> Result<()> {
    if !args.config_file.exists() {
        anyhow::bail!(
            "Configuration file not found: {}",
            args.config_file.display()
        );
    }

    let mut settings = config_loader::ConfigLoader::load_from_path(&args.config_file)
        .with_context(|| {
            format!(
                "Failed to load config from {}",
                args.config_file.display()
            )
        })?;
    apply_overrides(&mut settings, args, log_format);

    observability::init_with_config(ObservabilityConfig::from_settings(
        &settings.app,
        settings.server.metrics_port,
    ))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config_file.display(),
        port = settings.server.port,
        sinks = settings.sinks.len(),
        "logpipe starting"
    );

    service::bootstrap(&settings, HttpServe::new(settings.server.port))
        .await
        .context("Service failed")?;

    info!("logpipe finished");
    Ok(())
}

/// Command-line values win over the file
fn apply_overrides(settings: &mut Settings, args: &RunArgs, log_format: Option<LogFormat>) {
    if let Some(ref level) = args.log_level {
        settings.app.log_level = level.clone();
    }
    if let Some(format) = log_format {
        settings.app.log_format = format.into();
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    match args.metrics_port {
        Some(0) => settings.server.metrics_port = None,
        Some(port) => settings.server.metrics_port = Some(port),
        None => {}
    }
}
