//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Total successful writes
    write_count: AtomicU64,
    /// Total bytes accepted
    bytes_count: AtomicU64,
    /// Total write failures (panics included)
    failure_count: AtomicU64,
    /// Total writes that panicked
    panic_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn bytes_count(&self) -> u64 {
        self.bytes_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn panic_count(&self) -> u64 {
        self.panic_count.load(Ordering::Relaxed)
    }

    /// Record a successful write of `bytes`
    pub fn record_write(&self, bytes: usize) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_count.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a failed write
    pub fn record_failure(&self, panicked: bool) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        if panicked {
            self.panic_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            write_count: self.write_count(),
            bytes_count: self.bytes_count(),
            failure_count: self.failure_count(),
            panic_count: self.panic_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub write_count: u64,
    pub bytes_count: u64,
    pub failure_count: u64,
    pub panic_count: u64,
}
