//! Distributor - concurrent fan-out of one payload to every sink

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use contracts::{ConfigError, LineSink, SinkError};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::metrics::{MetricsSnapshot, SinkMetrics};

/// One registered sink and its delivery counters
struct Target {
    sink: Arc<dyn LineSink>,
    metrics: Arc<SinkMetrics>,
}

/// Writes each payload to all of its sinks concurrently.
///
/// Sinks are shared with whoever built them; the distributor never closes
/// them. Each call to [`write`](Self::write) holds the distributor's lock, so
/// two calls on one instance never interleave their per-sink writes.
pub struct Distributor {
    targets: Vec<Target>,
    lock: Mutex<()>,
}

impl Distributor {
    /// Assemble the sink set. `None` entries are dropped.
    ///
    /// # Errors
    /// [`ConfigError::DuplicateSink`] when the same sink instance appears twice.
    pub fn new<I, S>(sinks: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<Arc<dyn LineSink>>>,
    {
        let mut targets: Vec<Target> = Vec::new();
        for sink in sinks
            .into_iter()
            .filter_map(Into::<Option<Arc<dyn LineSink>>>::into)
        {
            if targets.iter().any(|t| same_sink(&t.sink, &sink)) {
                return Err(ConfigError::DuplicateSink {
                    name: sink.name().to_string(),
                });
            }
            targets.push(Target {
                sink,
                metrics: Arc::new(SinkMetrics::new()),
            });
        }

        Ok(Self {
            targets,
            lock: Mutex::new(()),
        })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Sinks in registration order
    pub fn sinks(&self) -> impl Iterator<Item = &Arc<dyn LineSink>> {
        self.targets.iter().map(|t| &t.sink)
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.targets
            .iter()
            .map(|t| (t.sink.name().to_string(), t.metrics.snapshot()))
            .collect()
    }

    /// Write `payload` to every sink and wait until each one has finished.
    ///
    /// Every sink receives the payload even when others fail or panic. The
    /// returned count is the largest count reported by a successful sink.
    ///
    /// # Errors
    /// One of the sink errors when at least one sink failed; which one is
    /// unspecified.
    #[instrument(
        name = "distributor_write",
        skip_all,
        fields(sinks = self.targets.len(), bytes = payload.as_ref().len())
    )]
    pub async fn write(&self, payload: impl Into<Bytes> + AsRef<[u8]>) -> Result<usize, SinkError> {
        let payload: Bytes = payload.into();
        let _guard = self.lock.lock().await;

        let pending: Vec<_> = self
            .targets
            .iter()
            .map(|target| {
                let sink = Arc::clone(&target.sink);
                let payload = payload.clone();
                let handle = tokio::task::spawn_blocking(move || guarded_write(&*sink, &payload));
                (target, handle)
            })
            .collect();

        let mut written = 0;
        let mut first_error = None;
        for (target, handle) in pending {
            let name = target.sink.name();
            let outcome = handle
                .await
                .unwrap_or_else(|e| Err(SinkError::panicked(name, e.to_string())));

            observability::record_sink_write(name, outcome.is_ok());
            match outcome {
                Ok(n) => {
                    target.metrics.record_write(n);
                    written = written.max(n);
                }
                Err(e) => {
                    target
                        .metrics
                        .record_failure(matches!(e, SinkError::Panicked { .. }));
                    warn!(sink = %name, error = %e, "Write failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        debug!(written, failed = first_error.is_some(), "Fan-out complete");
        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }
}

/// Run one sink's write, turning a panic into [`SinkError::Panicked`]
fn guarded_write(sink: &dyn LineSink, payload: &[u8]) -> Result<usize, SinkError> {
    panic::catch_unwind(AssertUnwindSafe(|| sink.write(payload)))
        .unwrap_or_else(|cause| Err(SinkError::panicked(sink.name(), panic_message(&*cause))))
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else if let Some(err) = cause.downcast_ref::<SinkError>() {
        err.to_string()
    } else {
        "unknown panic".to_string()
    }
}

/// Identity comparison; ignores vtable pointers
fn same_sink(a: &Arc<dyn LineSink>, b: &Arc<dyn LineSink>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
