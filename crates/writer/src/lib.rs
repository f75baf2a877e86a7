//! # Writer
//!
//! Delivery side of the pipeline.
//!
//! Responsible for:
//! - Fan-out of one rendered line to every configured sink
//! - Isolating slow, failing or panicking sinks from each other
//! - Buffered, periodically flushed persistence

pub mod distribute;
pub mod metrics;
pub mod sinks;

pub use contracts::{Backing, LineSink, SinkError};
pub use distribute::Distributor;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{BufferedSink, BufferedSinkBuilder, FileBacking, MemoryBacking};
