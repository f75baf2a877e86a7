//! LineReader - renders an entry into its canonical line exactly once

use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset};
use contracts::EntryError;
use tracing::{debug, error};

use crate::parser::{Entry, INFO};
use crate::timestamp::format_timestamp;

/// Byte source over one rendered line.
///
/// The line `[<timestamp>] [<KIND>] <message>` is computed on the first read
/// and cached. Reads hand out consecutive slices of it; once everything has
/// been handed out every further read returns `Ok(0)`. The reader is not
/// restartable, render again with a fresh `LineReader`.
///
/// `&LineReader` is also a reader, so several threads may drain one instance
/// concurrently; each byte is delivered to exactly one of them.
#[derive(Debug)]
pub struct LineReader {
    kind: String,
    message: String,
    timestamp: Option<DateTime<FixedOffset>>,

    rendered: OnceLock<Result<Box<[u8]>, EntryError>>,
    cursor: AtomicUsize,
    #[cfg(test)]
    renders: AtomicUsize,
}

impl LineReader {
    /// Create a reader from raw parts.
    ///
    /// Nothing is checked here; invalid parts surface as read errors.
    pub fn from_parts(
        kind: impl Into<String>,
        message: impl Into<String>,
        timestamp: Option<DateTime<FixedOffset>>,
    ) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            timestamp,
            rendered: OnceLock::new(),
            cursor: AtomicUsize::new(0),
            #[cfg(test)]
            renders: AtomicUsize::new(0),
        }
    }

    /// Rendered line, computing it on first use.
    ///
    /// # Errors
    /// [`EntryError::NilTimestamp`] without a timestamp,
    /// [`EntryError::EmptyMessage`] with an empty message.
    pub fn line(&self) -> Result<&[u8], EntryError> {
        match self.rendered.get_or_init(|| self.render()) {
            Ok(line) => Ok(line),
            Err(e) => Err(e.clone()),
        }
    }

    /// Bytes not handed out yet, or `None` before the line is rendered.
    ///
    /// Never renders; a failed render leaves nothing to hand out.
    pub fn remaining(&self) -> Option<usize> {
        self.rendered.get().map(|rendered| match rendered {
            Ok(line) => line.len().saturating_sub(self.cursor.load(Ordering::Acquire)),
            Err(_) => 0,
        })
    }

    fn render(&self) -> Result<Box<[u8]>, EntryError> {
        #[cfg(test)]
        self.renders.fetch_add(1, Ordering::Relaxed);

        let Some(timestamp) = self.timestamp else {
            error!(error = %EntryError::NilTimestamp, "rendering entry");
            return Err(EntryError::NilTimestamp);
        };
        if self.message.is_empty() {
            error!(error = %EntryError::EmptyMessage, "rendering entry");
            return Err(EntryError::EmptyMessage);
        }

        let kind = if self.kind.is_empty() {
            debug!("falling back to info");
            INFO
        } else {
            self.kind.as_str()
        };

        let ts = format_timestamp(&timestamp);
        let mut line = String::with_capacity(6 + ts.len() + kind.len() + self.message.len());
        line.push('[');
        line.push_str(&ts);
        line.push_str("] [");
        line.push_str(&kind.to_uppercase());
        line.push_str("] ");
        line.push_str(&self.message);

        Ok(line.into_bytes().into_boxed_slice())
    }

    /// Claim the next `want` bytes of `line`, returning the claimed range start
    /// and length.
    fn claim(&self, line_len: usize, want: usize) -> (usize, usize) {
        let mut start = self.cursor.load(Ordering::Acquire);
        loop {
            let n = want.min(line_len.saturating_sub(start));
            if n == 0 {
                return (start, 0);
            }
            match self.cursor.compare_exchange_weak(
                start,
                start + n,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return (start, n),
                Err(current) => start = current,
            }
        }
    }
}

impl From<Entry> for LineReader {
    fn from(entry: Entry) -> Self {
        let (kind, message, timestamp) = entry.into_parts();
        Self::from_parts(kind, message, Some(timestamp))
    }
}

impl Read for &LineReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let line = self
            .line()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let (start, n) = self.claim(line.len(), buf.len());
        buf[..n].copy_from_slice(&line[start..start + n]);
        Ok(n)
    }
}

impl Read for LineReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(&mut &*self, buf)
    }
}
