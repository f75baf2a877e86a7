//! LineSink trait - Distributor output interface
//!
//! Defines the abstract interface for sinks and the resources they wrap.

use crate::SinkError;

/// Destination for rendered lines.
///
/// Implementations are shared between the request path, the distributor and
/// their own background tasks, so every method takes `&self` and any mutable
/// state lives behind the implementation's own lock.
pub trait LineSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one payload, returning how many payload bytes were accepted
    ///
    /// # Errors
    /// Returns [`SinkError::Closed`] after [`close`](Self::close), or the
    /// backing resource failure.
    fn write(&self, payload: &[u8]) -> Result<usize, SinkError>;

    /// Flush buffer (if any)
    fn flush(&self) -> Result<(), SinkError>;

    /// Close sink
    fn close(&self) -> Result<(), SinkError>;
}

/// Writable, closable, named resource a buffered sink persists into.
///
/// The resource is opened by whoever constructs the sink and handed over.
pub trait Backing: std::io::Write + Send {
    /// Resource name, e.g. the file location
    fn name(&self) -> &str;

    /// Release the resource. Called once, after the final flush.
    fn close(&mut self) -> std::io::Result<()>;
}
