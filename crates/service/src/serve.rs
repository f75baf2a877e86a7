//! Serve strategies: how the router is exposed and when serving stops

use std::net::{Ipv4Addr, SocketAddr};

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ServiceError;

/// Runs the router until it decides to stop.
///
/// Returning hands control back to [`bootstrap`](crate::bootstrap), which then
/// shuts the service down.
#[trait_variant::make(ServeStrategy: Send)]
pub trait LocalServeStrategy {
    async fn serve(self, app: Router) -> Result<(), ServiceError>;
}

/// Plain HTTP listener on all interfaces.
///
/// Stops on Ctrl+C, SIGTERM or cancellation of its token, after in-progress
/// requests finish.
#[derive(Debug, Clone)]
pub struct HttpServe {
    addr: SocketAddr,
    shutdown_token: CancellationToken,
}

impl HttpServe {
    pub fn new(port: u16) -> Self {
        Self::on(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    pub fn on(addr: SocketAddr) -> Self {
        Self {
            addr,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Token that stops the listener when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }
}

impl ServeStrategy for HttpServe {
    async fn serve(self, app: Router) -> Result<(), ServiceError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServiceError::Bind {
                addr: self.addr,
                source,
            })?;
        let local = listener.local_addr().unwrap_or(self.addr);
        info!(addr = %local, "Listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(self.shutdown_token))
            .await
            .map_err(ServiceError::Serve)?;

        info!("http server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl+C, SIGTERM or token cancellation
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
        _ = token.cancelled() => info!("Shutdown requested"),
    }
}
