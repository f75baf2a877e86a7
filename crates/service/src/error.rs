//! Service error types

use std::io;
use std::net::SocketAddr;

use contracts::{ConfigError, EntryError};
use thiserror::Error;

/// Errors raised while starting or running the service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid settings or sinks that could not be opened
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Listener failed while serving
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Why a submission was rejected
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Entry(#[from] EntryError),

    /// Rendered line could not be read
    #[error("reading line: {0}")]
    Read(io::Error),
}

impl IngestError {
    /// Metrics label
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Entry(e) => e.reason(),
            Self::Read(_) => "read",
        }
    }
}

impl From<io::Error> for IngestError {
    fn from(e: io::Error) -> Self {
        match e.get_ref().and_then(|inner| inner.downcast_ref::<EntryError>()) {
            Some(entry) => Self::Entry(entry.clone()),
            None => Self::Read(e),
        }
    }
}
