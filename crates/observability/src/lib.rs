//! # Observability
//!
//! Tracing subscriber setup and Prometheus metrics for the log pipeline.
//!
//! ## Features
//!
//! - Tracing initialization (JSON, pretty or compact output)
//! - Prometheus exporter on an optional port
//! - Counters for accepted/rejected entries and per-sink writes
//!
//! ## Usage
//!
//! ```ignore
//! use observability::{init_with_config, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig::from_settings(&settings.app, settings.server.metrics_port))?;
//! observability::record_entry_accepted();
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use contracts::{AppSettings, LogFormat};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_entry_accepted, record_entry_rejected, record_fanout_latency_ms, record_sink_write,
    IngestStats, RunningStats,
};

/// Levels accepted by `--log-level` and `[app].log_level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Fallback when the configured level is not recognized
pub const FALLBACK_LOG_LEVEL: &str = "error";

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            metrics_port: None,
            default_log_level: FALLBACK_LOG_LEVEL.to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn from_settings(app: &AppSettings, metrics_port: Option<u16>) -> Self {
        Self {
            log_format: app.log_format,
            metrics_port,
            default_log_level: app.log_level.clone(),
        }
    }
}

/// Map a level name onto one the filter understands.
///
/// Matching ignores case and surrounding whitespace; `warning` is accepted as
/// `warn`. Anything else falls back to [`FALLBACK_LOG_LEVEL`].
pub fn normalize_level(level: &str) -> &'static str {
    let level = level.trim().to_ascii_lowercase();
    if level == "warning" {
        return "warn";
    }
    LOG_LEVELS
        .iter()
        .find(|known| **known == level)
        .copied()
        .unwrap_or(FALLBACK_LOG_LEVEL)
}

/// Initialize tracing and, when a port is set, the Prometheus exporter
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let level = normalize_level(&config.default_log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.log_format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    let requested = config.default_log_level.trim();
    if level == FALLBACK_LOG_LEVEL && !requested.eq_ignore_ascii_case(FALLBACK_LOG_LEVEL) {
        tracing::warn!(
            requested = %config.default_log_level,
            using = level,
            "Unrecognized log level"
        );
    }
    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// Install only the Prometheus recorder and its HTTP listener
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.default_log_level, "error");
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("info"), "info");
        assert_eq!(normalize_level(" DEBUG "), "debug");
        assert_eq!(normalize_level("warning"), "warn");
        assert_eq!(normalize_level("loud"), "error");
        assert_eq!(normalize_level(""), "error");
    }

    #[test]
    fn test_from_settings() {
        let app = AppSettings {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        };
        let config = ObservabilityConfig::from_settings(&app, Some(9100));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.metrics_port, Some(9100));
        assert_eq!(config.default_log_level, "info");
    }
}
