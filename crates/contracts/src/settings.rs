//! Settings - Config Loader output
//!
//! Describes the whole service: its own logging, the listener and the sinks.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Smallest flush interval a buffered sink accepts
pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Flush interval used when none is configured
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Buffer size used when none is configured
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Time allowed for in-flight deliveries at shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Service's own diagnostics
    #[serde(default)]
    pub app: AppSettings,

    /// Listener settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkSettings>,
}

/// Diagnostic logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Level for the service's own logs
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format for the service's own logs
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "error".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Port to listen for incoming payloads
    #[serde(default = "default_port")]
    pub port: u16,

    /// Time allowed for in-flight deliveries at shutdown
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Prometheus exporter port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl ServerSettings {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            metrics_port: None,
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout_ms() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT.as_millis() as u64
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSettings {
    /// Sink name
    pub name: String,

    /// Sink type
    #[serde(rename = "type")]
    pub sink_type: SinkType,

    /// File location, required for file sinks
    #[serde(default)]
    pub location: Option<PathBuf>,

    /// Delay between background flushes
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Bytes buffered before a write forces a flush
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl SinkSettings {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL.as_millis() as u64
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Append to a file on disk
    File,
    /// Anything this build does not know how to open; skipped at bootstrap
    #[serde(other)]
    Unsupported,
}
