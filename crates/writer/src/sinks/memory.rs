//! MemoryBacking - in-process backing resource

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::Backing;

/// Backing resource that keeps everything in memory.
///
/// Clones share the same storage, so one clone can be handed to a
/// [`BufferedSink`](super::BufferedSink) while another inspects what reached it.
#[derive(Debug, Clone)]
pub struct MemoryBacking {
    name: String,
    data: Arc<Mutex<Vec<u8>>>,
    closed: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
}

impl MemoryBacking {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Arc::default(),
            closed: Arc::default(),
            failing: Arc::default(),
        }
    }

    /// Everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Contents as UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Make every following write fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

impl Write for MemoryBacking {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failing.load(Ordering::Acquire) {
            return Err(io::Error::other("memory backing set to fail"));
        }
        if self.is_closed() {
            return Err(io::Error::other("memory backing closed"));
        }
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Backing for MemoryBacking {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
