//! # Entry
//!
//! Turns an inbound JSON payload into the canonical one-line text form.
//!
//! ```text
//! {"type":"error","timestamp":"2017-10-09 10:45:00","message":"something happened"}
//! ```
//!
//! becomes
//!
//! ```text
//! [2017-10-09T10:45:00Z] [ERROR] something happened
//! ```
//!
//! - [`parse`] decodes and validates the payload, applying defaults
//! - [`LineReader`] renders the line once and hands it out through [`std::io::Read`]

pub mod line;
pub mod parser;
pub mod timestamp;

pub use contracts::EntryError;
pub use line::LineReader;
pub use parser::{parse, Entry, ERROR, INFO, WARN};
pub use timestamp::{format_timestamp, parse_timestamp};
