//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{Settings, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    port: u16,
    log_level: String,
    metrics_port: Option<u16>,
    sinks: Vec<SinkSummary>,
}

#[derive(Serialize)]
struct SinkSummary {
    name: String,
    location: Option<String>,
    flush_interval_ms: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config_file.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config_file.display().to_string();

    if !args.config_file.exists() {
        return ValidationResult {
            valid: false,
            errors: vec![format!("File not found: {config_path}")],
            config_path,
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config_file) {
        Ok(settings) => ValidationResult {
            valid: true,
            config_path,
            errors: Vec::new(),
            warnings: collect_warnings(&settings),
            summary: Some(summarize(&settings)),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            errors: e.errors().iter().map(ToString::to_string).collect(),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

fn summarize(settings: &Settings) -> ConfigSummary {
    ConfigSummary {
        port: settings.server.port,
        log_level: observability::normalize_level(&settings.app.log_level).to_string(),
        metrics_port: settings.server.metrics_port,
        sinks: settings
            .sinks
            .iter()
            .filter(|s| s.sink_type == SinkType::File)
            .map(|s| SinkSummary {
                name: s.name.clone(),
                location: s.location.as_ref().map(|p| p.display().to_string()),
                flush_interval_ms: s.flush_interval_ms,
            })
            .collect(),
    }
}

/// Non-fatal issues
fn collect_warnings(settings: &Settings) -> Vec<String> {
    let mut warnings = Vec::new();

    for sink in &settings.sinks {
        if sink.sink_type == SinkType::Unsupported {
            warnings.push(format!("Sink '{}' has an unsupported type and will be skipped", sink.name));
        }
    }
    if settings.sinks.iter().all(|s| s.sink_type != SinkType::File) {
        warnings.push("No file sinks configured - the service will refuse to start".to_string());
    }

    let level = observability::normalize_level(&settings.app.log_level);
    if level == observability::FALLBACK_LOG_LEVEL
        && !settings.app.log_level.trim().eq_ignore_ascii_case(level)
    {
        warnings.push(format!(
            "Unrecognized log level '{}', falling back to '{level}'",
            settings.app.log_level
        ));
    }

    if settings.server.metrics_port == Some(settings.server.port) {
        warnings.push(format!(
            "Metrics port {} is the same as the service port",
            settings.server.port
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Port: {}", summary.port);
            println!("  Log level: {}", summary.log_level);
            if let Some(port) = summary.metrics_port {
                println!("  Metrics port: {port}");
            }
            println!("  Sinks: {}", summary.sinks.len());
            for sink in &summary.sinks {
                println!(
                    "    - {} -> {} (flush every {}ms)",
                    sink.name,
                    sink.location.as_deref().unwrap_or("?"),
                    sink.flush_interval_ms
                );
            }
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        for error in &result.errors {
            println!("\n  Error: {error}");
        }
    }
}
