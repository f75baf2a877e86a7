//! # Service
//!
//! HTTP front of the log pipeline.
//!
//! Responsibilities:
//! - Accept `POST /` submissions and answer before any sink is touched
//! - Hand each rendered line to the fan-out writer in a tracked task
//! - Drain in-flight deliveries and close the sinks on shutdown
//!
//! How the router is served is a parameter of [`bootstrap`]; [`HttpServe`]
//! is the production strategy.

mod bootstrap;
mod error;
mod handler;
mod serve;
mod service;

pub use bootstrap::{bootstrap, open_sinks};
pub use error::{IngestError, ServiceError};
pub use handler::router;
pub use serve::{HttpServe, LocalServeStrategy, ServeStrategy};
pub use service::{LogService, LogServiceBuilder};
