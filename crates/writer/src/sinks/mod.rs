//! Sink implementations
//!
//! `BufferedSink` plus the resources it can wrap.

mod buffered;
mod file;
mod memory;

pub use self::buffered::{BufferedSink, BufferedSinkBuilder};
pub use self::file::FileBacking;
pub use self::memory::MemoryBacking;
