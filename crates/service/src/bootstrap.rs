//! Wiring from [`Settings`] to a running service

use std::sync::Arc;

use contracts::{ConfigError, LineSink, Settings, SinkSettings, SinkType};
use tracing::{info, instrument, warn};
use writer::{BufferedSink, FileBacking};

use crate::error::ServiceError;
use crate::handler::router;
use crate::serve::ServeStrategy;
use crate::service::LogService;

/// Open every supported sink described by `settings`.
///
/// Entries of an unsupported type are skipped with a warning. Must run inside
/// a tokio runtime, which hosts the sinks' flush tasks.
///
/// # Errors
/// The first sink that cannot be opened or configured. Sinks opened before it
/// are dropped unflushed, having received nothing.
pub fn open_sinks(settings: &Settings) -> Result<Vec<Arc<dyn LineSink>>, ConfigError> {
    let mut sinks = Vec::with_capacity(settings.sinks.len());
    for sink in &settings.sinks {
        match sink.sink_type {
            SinkType::File => sinks.push(open_file_sink(sink)?),
            SinkType::Unsupported => {
                warn!(sink = %sink.name, "Unsupported sink type, skipping");
            }
        }
    }
    Ok(sinks)
}

fn open_file_sink(settings: &SinkSettings) -> Result<Arc<dyn LineSink>, ConfigError> {
    let location = settings.location.as_ref().ok_or_else(|| {
        ConfigError::validation(
            format!("sinks[{}].location", settings.name),
            "file sink requires a location",
        )
    })?;

    let sink = BufferedSink::builder(FileBacking::open(location)?)
        .name(settings.name.clone())
        .flush_interval(settings.flush_interval())
        .buffer_capacity(settings.buffer_capacity)
        .build()?;
    info!(
        sink = %settings.name,
        location = %location.display(),
        "File sink opened"
    );
    Ok(sink)
}

/// Build the service from `settings`, serve it with `strategy`, then shut it
/// down.
///
/// Shutdown runs even when serving fails; the serving error wins.
///
/// # Errors
/// Invalid settings, sinks that cannot be opened, or a failing strategy.
#[instrument(name = "bootstrap", skip_all)]
pub async fn bootstrap<S: ServeStrategy>(
    settings: &Settings,
    strategy: S,
) -> Result<(), ServiceError> {
    let service = LogService::builder()
        .sinks(open_sinks(settings)?)
        .shutdown_timeout(settings.server.shutdown_timeout())
        .build()?;
    let service = Arc::new(service);
    info!(sinks = service.distributor().len(), "Service ready");

    let served = strategy.serve(router(Arc::clone(&service))).await;
    if let Err(e) = service.shutdown().await {
        warn!(error = %e, "Shutdown finished with errors");
    }
    served
}
