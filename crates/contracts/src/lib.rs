//! # Contracts
//!
//! Interface contracts shared by every logpipe crate: the sink traits, the
//! error taxonomy and the configuration model.
//! Business crates depend on this crate only, never the other way around.
//!
//! ## Pipeline
//! - payload -> `entry::parse` -> `entry::LineReader` -> `writer::Distributor` -> N sinks
//! - the distributor only knows about [`LineSink`]; buffered sinks wrap a [`Backing`]

mod error;
mod settings;
mod sink;

pub use error::*;
pub use settings::*;
pub use sink::*;
