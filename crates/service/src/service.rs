//! LogService - accepts submissions and hands rendered lines to the sinks

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use contracts::{ConfigError, LineSink, SinkError, DEFAULT_SHUTDOWN_TIMEOUT};
use entry::LineReader;
use observability::IngestStats;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, warn};
use writer::Distributor;

use crate::error::IngestError;

/// Request-side half of the pipeline.
///
/// Each accepted submission is rendered synchronously and delivered to every
/// sink by a background task; the caller never waits for the sinks.
///
/// Deliveries are tracked. [`shutdown`](Self::shutdown) waits for them (up to
/// the shutdown timeout) and then closes every sink once.
pub struct LogService {
    distributor: Arc<Distributor>,
    tracker: TaskTracker,
    shutdown_timeout: Duration,
    stats: Arc<Mutex<IngestStats>>,
    shut_down: AtomicBool,
}

/// Builder for [`LogService`]
#[derive(Default)]
pub struct LogServiceBuilder {
    sinks: Vec<Arc<dyn LineSink>>,
    shutdown_timeout: Option<Duration>,
    errors: Vec<ConfigError>,
}

impl LogServiceBuilder {
    /// Add one sink; `None` is ignored
    pub fn sink(mut self, sink: impl Into<Option<Arc<dyn LineSink>>>) -> Self {
        if let Some(sink) = sink.into() {
            self.sinks.push(sink);
        }
        self
    }

    pub fn sinks<I>(self, sinks: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn LineSink>>,
    {
        sinks.into_iter().fold(self, Self::sink)
    }

    /// Time allowed for in-flight deliveries at shutdown
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            self.errors.push(ConfigError::ZeroShutdownTimeout);
        } else {
            self.shutdown_timeout = Some(timeout);
        }
        self
    }

    /// # Errors
    /// Every collected error: a zero timeout, no sinks, a sink registered twice.
    pub fn build(self) -> Result<LogService, ConfigError> {
        let mut errors = self.errors;
        if self.sinks.is_empty() {
            errors.push(ConfigError::NoSinks);
        }
        let distributor = match Distributor::new(self.sinks) {
            Ok(distributor) => Some(distributor),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        if let Some(err) = ConfigError::collect(errors) {
            return Err(err);
        }
        let Some(distributor) = distributor else {
            return Err(ConfigError::NoSinks);
        };

        Ok(LogService {
            distributor: Arc::new(distributor),
            tracker: TaskTracker::new(),
            shutdown_timeout: self.shutdown_timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
            stats: Arc::default(),
            shut_down: AtomicBool::new(false),
        })
    }
}

impl LogService {
    pub fn builder() -> LogServiceBuilder {
        LogServiceBuilder::default()
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    pub fn distributor(&self) -> &Arc<Distributor> {
        &self.distributor
    }

    /// Deliveries started but not finished
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Totals since the service was built
    pub fn stats(&self) -> IngestStats {
        self.lock_stats().clone()
    }

    /// Parse and render `body`, then start delivering the line.
    ///
    /// Returns once the line is rendered; delivery failures are only logged.
    ///
    /// # Errors
    /// The reason `body` is not an acceptable entry.
    pub fn ingest(&self, body: &[u8]) -> Result<(), IngestError> {
        let line = match render(body) {
            Ok(line) => line,
            Err(e) => {
                observability::record_entry_rejected(e.reason());
                self.lock_stats().reject(e.reason());
                return Err(e);
            }
        };
        observability::record_entry_accepted();
        self.lock_stats().accept();

        let distributor = Arc::clone(&self.distributor);
        let stats = Arc::clone(&self.stats);
        let started = Instant::now();
        self.tracker.spawn(async move {
            let result = distributor.write(line).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
            observability::record_fanout_latency_ms(latency_ms);

            if let Err(e) = &result {
                error!(sink = %e.sink(), error = %e, "Delivering line");
            }
            stats
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .deliver(result.is_ok(), latency_ms);
        });
        Ok(())
    }

    /// Wait for in-flight deliveries, then close every sink.
    ///
    /// Later calls return `Ok(())` without doing anything.
    ///
    /// # Errors
    /// The first sink that failed to close; the others are still closed.
    #[instrument(name = "log_service_shutdown", skip(self))]
    pub async fn shutdown(&self) -> Result<(), SinkError> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.tracker.close();
        if tokio::time::timeout(self.shutdown_timeout, self.tracker.wait())
            .await
            .is_err()
        {
            warn!(
                pending = self.tracker.len(),
                timeout_ms = self.shutdown_timeout.as_millis() as u64,
                "Deliveries still running at shutdown timeout"
            );
        }

        let mut first_error = None;
        for sink in self.distributor.sinks() {
            let sink = Arc::clone(sink);
            let name = sink.name().to_string();
            let result = tokio::task::spawn_blocking(move || sink.close())
                .await
                .unwrap_or_else(|e| Err(SinkError::panicked(&name, e.to_string())));

            match result {
                Ok(()) => debug!(sink = %name, "Sink closed"),
                Err(e) => {
                    error!(sink = %name, error = %e, "Closing sink");
                    first_error.get_or_insert(e);
                }
            }
        }

        for (name, snapshot) in self.distributor.metrics() {
            debug!(
                sink = %name,
                writes = snapshot.write_count,
                failures = snapshot.failure_count,
                panics = snapshot.panic_count,
                "Sink totals"
            );
        }
        info!(stats = %self.stats(), "Service stopped");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn lock_stats(&self) -> MutexGuard<'_, IngestStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Parse `body` and drain its line reader
fn render(body: &[u8]) -> Result<Vec<u8>, IngestError> {
    let reader = LineReader::from(entry::parse(body)?);
    let mut line = Vec::with_capacity(reader.line()?.len());
    (&reader).read_to_end(&mut line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EntryError;
    use writer::{BufferedSink, MemoryBacking};

    fn memory_sink(name: &str) -> (MemoryBacking, Arc<dyn LineSink>) {
        let backing = MemoryBacking::new(name);
        let sink: Arc<dyn LineSink> = BufferedSink::builder(backing.clone())
            .flush_interval(Duration::from_secs(3600))
            .build()
            .unwrap();
        (backing, sink)
    }

    #[tokio::test]
    async fn test_builder_requires_sinks() {
        let err = LogService::builder().build().err().unwrap();
        assert!(matches!(err, ConfigError::NoSinks));
    }

    #[tokio::test]
    async fn test_builder_aggregates_errors() {
        let (_, sink) = memory_sink("mem");
        let err = LogService::builder()
            .sink(Arc::clone(&sink))
            .sink(sink)
            .shutdown_timeout(Duration::ZERO)
            .build()
            .err()
            .unwrap();

        let errors = err.errors();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ConfigError::ZeroShutdownTimeout));
        assert!(matches!(errors[1], ConfigError::DuplicateSink { .. }));
    }

    #[tokio::test]
    async fn test_builder_defaults() {
        let (_, sink) = memory_sink("mem");
        let service = LogService::builder()
            .sink(None::<Arc<dyn LineSink>>)
            .sinks([sink])
            .build()
            .unwrap();
        assert_eq!(service.shutdown_timeout(), DEFAULT_SHUTDOWN_TIMEOUT);
        assert_eq!(service.distributor().len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_delivers_to_all_sinks() {
        let (first, a) = memory_sink("first");
        let (second, b) = memory_sink("second");
        let service = LogService::builder().sinks([a, b]).build().unwrap();

        service
            .ingest(br#"{"message":"hello","type":"warning","timestamp":"2017-10-09T10:45:00Z"}"#)
            .unwrap();
        service.shutdown().await.unwrap();

        let expected = "[2017-10-09T10:45:00Z] [WARNING] hello\n";
        assert_eq!(first.text(), expected);
        assert_eq!(second.text(), expected);
        assert!(first.is_closed() && second.is_closed());

        let stats = service.stats();
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.delivered, 1);
    }

    #[tokio::test]
    async fn test_ingest_rejects_bad_input() {
        let (backing, sink) = memory_sink("mem");
        let service = LogService::builder().sink(sink).build().unwrap();

        let err = service.ingest(b"{}").unwrap_err();
        assert!(matches!(err, IngestError::Entry(EntryError::EmptyObject)));
        let err = service.ingest(b"not json").unwrap_err();
        assert!(matches!(err, IngestError::Entry(EntryError::CorruptedPayload { .. })));

        service.shutdown().await.unwrap();
        assert!(backing.text().is_empty());
        assert_eq!(service.stats().total_rejected(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (backing, sink) = memory_sink("mem");
        let service = LogService::builder().sink(sink).build().unwrap();

        service.shutdown().await.unwrap();
        service.shutdown().await.unwrap();
        assert!(backing.is_closed());
    }

    #[tokio::test]
    async fn test_shutdown_reports_close_failure() {
        let (failing, a) = memory_sink("failing");
        let (healthy, b) = memory_sink("healthy");
        let service = LogService::builder().sinks([a, b]).build().unwrap();

        service.ingest(br#"{"message":"m"}"#).unwrap();
        service.tracker.close();
        service.tracker.wait().await;
        failing.set_failing(true);

        let err = service.shutdown().await.unwrap_err();
        assert_eq!(err.sink(), "failing");
        assert!(healthy.is_closed());
        assert!(healthy.text().ends_with("] [INFO] m\n"));
    }
}
