//! Layered error definitions
//!
//! Categorized by source: entry (input) / sink (delivery) / config (bootstrap)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ===== Input Errors =====

/// Errors raised while turning an inbound payload into a rendered line.
///
/// These are always the client's fault and are reported back synchronously.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    /// Payload is not a decodable JSON object
    #[error("corrupted payload: {message}")]
    CorruptedPayload { message: String },

    /// Payload decoded to `{}`
    #[error("empty object")]
    EmptyObject,

    /// `message` is absent, empty or not a string
    #[error("empty message")]
    EmptyMessage,

    /// `timestamp` is present but could not be parsed
    #[error("invalid timestamp: {value:?}")]
    InvalidTimestamp { value: String },

    /// Rendering was attempted without a timestamp
    #[error("nil timestamp")]
    NilTimestamp,
}

impl EntryError {
    /// Create a corrupted payload error
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::CorruptedPayload {
            message: message.into(),
        }
    }

    /// Create an invalid timestamp error
    pub fn invalid_timestamp(value: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
        }
    }

    /// Short label used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::CorruptedPayload { .. } => "corrupted_payload",
            Self::EmptyObject => "empty_object",
            Self::EmptyMessage => "empty_message",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::NilTimestamp => "nil_timestamp",
        }
    }
}

// ===== Sink Errors =====

/// Errors raised by a single sink while delivering a payload.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink was already closed
    #[error("sink '{sink}' is closed")]
    Closed { sink: String },

    /// Backing resource failed
    #[error("sink '{sink}' write error: {source}")]
    Io {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// Sink panicked while writing; captured at the fan-out boundary
    #[error("sink '{sink}' panicked: {message}")]
    Panicked { sink: String, message: String },
}

impl SinkError {
    /// Create a closed error
    pub fn closed(sink: impl Into<String>) -> Self {
        Self::Closed { sink: sink.into() }
    }

    /// Create an io error
    pub fn io(sink: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            sink: sink.into(),
            source,
        }
    }

    /// Create a panic error
    pub fn panicked(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Panicked {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Name of the sink that failed
    pub fn sink(&self) -> &str {
        match self {
            Self::Closed { sink } | Self::Io { sink, .. } | Self::Panicked { sink, .. } => sink,
        }
    }
}

// ===== Configuration Errors =====

/// Errors raised while assembling sinks and the service.
///
/// All of these happen before the listener accepts traffic.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Flush interval below the allowed floor
    #[error("low ({interval:?}) flush interval, minimum is {minimum:?}")]
    FlushIntervalTooLow { interval: Duration, minimum: Duration },

    /// Buffer capacity of zero
    #[error("buffer capacity cannot be zero")]
    ZeroBufferCapacity,

    /// Shutdown timeout of zero
    #[error("timeout cannot be zero")]
    ZeroShutdownTimeout,

    /// No sinks were registered
    #[error("no sinks specified")]
    NoSinks,

    /// The same sink instance was registered twice
    #[error("duplicated sink '{name}'")]
    DuplicateSink { name: String },

    /// Backing resource could not be opened
    #[error("backing resource unavailable at '{}': {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No tokio runtime to host the background flush task
    #[error("no tokio runtime available for background flushing")]
    NoRuntime,

    /// Configuration parse error
    #[error("config parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    /// Several errors collected by a builder
    #[error("{}", join_errors(.0))]
    Aggregate(Vec<ConfigError>),
}

impl ConfigError {
    /// Create configuration parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create backing resource error
    pub fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unavailable {
            path: path.into(),
            source,
        }
    }

    /// Collapse builder errors: `None` when empty, the error itself when single.
    pub fn collect(mut errors: Vec<ConfigError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Aggregate(errors)),
        }
    }

    /// Flattened view of the contained errors
    pub fn errors(&self) -> Vec<&ConfigError> {
        match self {
            Self::Aggregate(errors) => errors.iter().flat_map(ConfigError::errors).collect(),
            other => vec![other],
        }
    }
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
