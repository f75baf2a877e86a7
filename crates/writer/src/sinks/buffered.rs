//! BufferedSink - batches writes and flushes them on a timer

use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use contracts::{
    Backing, ConfigError, LineSink, SinkError, DEFAULT_BUFFER_CAPACITY, DEFAULT_FLUSH_INTERVAL,
    MIN_FLUSH_INTERVAL,
};
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, instrument};

/// Sink that buffers lines in memory and persists them to a [`Backing`]
/// resource.
///
/// Written lines become visible in the backing resource after an explicit
/// [`flush`](LineSink::flush), after the periodic background flush, when the
/// buffer fills up, or on [`close`](LineSink::close). A line is handed to
/// the buffer together with its `\n` terminator, so a line too large for the
/// buffer reaches the backing whole.
///
/// `close` is idempotent, but it is meant to be called from the single owner
/// of the sink (the service at shutdown, or a test at teardown).
pub struct BufferedSink<B: Backing> {
    name: String,
    flush_interval: Duration,
    buffer: Mutex<BufWriter<B>>,
    closed: AtomicBool,
}

/// Builder for [`BufferedSink`]; validation errors are collected and reported
/// together by [`build`](Self::build).
pub struct BufferedSinkBuilder<B: Backing> {
    backing: B,
    name: Option<String>,
    flush_interval: Duration,
    buffer_capacity: usize,
    errors: Vec<ConfigError>,
}

impl<B: Backing + 'static> BufferedSinkBuilder<B> {
    /// Name used in logs and errors; defaults to the backing resource's name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Delay between background flushes; must be at least [`MIN_FLUSH_INTERVAL`]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        if interval < MIN_FLUSH_INTERVAL {
            self.errors.push(ConfigError::FlushIntervalTooLow {
                interval,
                minimum: MIN_FLUSH_INTERVAL,
            });
        } else {
            self.flush_interval = interval;
        }
        self
    }

    /// Bytes held in memory before a write forces a flush
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        if capacity == 0 {
            self.errors.push(ConfigError::ZeroBufferCapacity);
        } else {
            self.buffer_capacity = capacity;
        }
        self
    }

    /// Validate and start the sink's background flush task.
    ///
    /// # Errors
    /// Every collected validation error, or [`ConfigError::NoRuntime`] when
    /// called outside a tokio runtime. Nothing is started on error.
    pub fn build(self) -> Result<Arc<BufferedSink<B>>, ConfigError> {
        if let Some(err) = ConfigError::collect(self.errors) {
            return Err(err);
        }
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        let sink = Arc::new(BufferedSink {
            name: self.name.unwrap_or_else(|| self.backing.name().to_string()),
            flush_interval: self.flush_interval,
            buffer: Mutex::new(BufWriter::with_capacity(self.buffer_capacity, self.backing)),
            closed: AtomicBool::new(false),
        });

        runtime.spawn(flush_periodically(Arc::downgrade(&sink), sink.flush_interval));
        debug!(
            sink = %sink.name,
            interval_ms = sink.flush_interval.as_millis() as u64,
            "BufferedSink started"
        );

        Ok(sink)
    }
}

impl<B: Backing + 'static> BufferedSink<B> {
    /// Start building a sink over `backing`
    pub fn builder(backing: B) -> BufferedSinkBuilder<B> {
        BufferedSinkBuilder {
            backing,
            name: None,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            errors: Vec::new(),
        }
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn lock(&self) -> MutexGuard<'_, BufWriter<B>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn io_error(&self, e: std::io::Error) -> SinkError {
        SinkError::io(&self.name, e)
    }
}

impl<B: Backing + 'static> LineSink for BufferedSink<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, payload: &[u8]) -> Result<usize, SinkError> {
        if self.is_closed() {
            return Err(SinkError::closed(&self.name));
        }

        let mut buffer = self.lock();
        if self.is_closed() {
            return Err(SinkError::closed(&self.name));
        }

        let written = if payload.ends_with(b"\n") {
            buffer.write_all(payload)
        } else {
            // Payload and terminator in one write; a spill keeps the line whole
            buffer.write_all(&[payload, b"\n".as_slice()].concat())
        };
        written.map_err(|e| self.io_error(e))?;
        Ok(payload.len())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut buffer = self.lock();
        if self.is_closed() {
            return Ok(());
        }
        buffer.flush().map_err(|e| self.io_error(e))
    }

    #[instrument(name = "buffered_sink_close", skip(self), fields(sink = %self.name))]
    fn close(&self) -> Result<(), SinkError> {
        let mut buffer = self.lock();
        if self.is_closed() {
            return Ok(());
        }

        let flushed = buffer.flush();
        self.closed.store(true, Ordering::Release);
        let released = buffer.get_mut().close();

        flushed.and(released).map_err(|e| self.io_error(e))?;
        debug!("BufferedSink closed");
        Ok(())
    }
}

/// Background task: flush every `interval` until the sink is closed or dropped
async fn flush_periodically<B: Backing + 'static>(
    sink: Weak<BufferedSink<B>>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(sink) = sink.upgrade() else {
            break;
        };
        if sink.is_closed() {
            break;
        }

        let name = sink.name.clone();
        match tokio::task::spawn_blocking(move || sink.flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(sink = %name, error = %e, "Periodic flush failed"),
            Err(e) => error!(sink = %name, error = %e, "Periodic flush task failed"),
        }
    }
}
