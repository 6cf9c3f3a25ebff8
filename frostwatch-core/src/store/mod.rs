//! Persistent log store
//!
//! The store is an append-only, byte-sequential text log. The core needs four
//! things from it and nothing else:
//! - open for append, write whole lines, close
//! - size in bytes
//! - seek to an arbitrary byte offset
//! - read forward one line at a time
//!
//! ## Module Organization
//!
//! - Contract and errors (this file)
//! - `file` - `std::fs` backed store (requires `std`)
//! - `memory` - in-memory store for tests and simulation
//!
//! Each open returns a handle that borrows the store; dropping the handle
//! releases it. The write path and the read path never hold a handle across a
//! scheduler pass.

use thiserror_no_std::Error;

use crate::constants::buffers::MAX_LINE_LEN;
use crate::record::LineBuf;

#[cfg(feature = "std")]
pub mod file;
pub mod memory;

#[cfg(feature = "std")]
pub use file::{FileLogStore, FileReader};
pub use memory::{MemoryLogStore, MemoryReader};

/// Errors from the log store
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Store was never mounted, or mounting failed
    #[error("Store not mounted")]
    NotMounted,

    /// Store could not be opened
    #[error("Store unavailable: {operation}")]
    Unavailable {
        /// What the open was for
        operation: &'static str,
    },

    /// I/O failed on an open handle
    #[error("Store I/O failed: {operation}")]
    Io {
        /// Which operation failed
        operation: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for StoreError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NotMounted => defmt::write!(fmt, "Store not mounted"),
            Self::Unavailable { operation } => defmt::write!(fmt, "Store unavailable: {}", operation),
            Self::Io { operation } => defmt::write!(fmt, "Store I/O failed: {}", operation),
        }
    }
}

/// Append-only line log
pub trait LogStore {
    /// Handle for appending lines
    type Appender<'a>: LogAppender
    where
        Self: 'a;

    /// Independent handle for reading
    type Reader<'a>: LogReader
    where
        Self: 'a;

    /// Prepare the store for use; failure here is fatal at start-up
    fn mount(&mut self) -> Result<(), StoreError>;

    /// Open for append
    fn open_append(&mut self) -> Result<Self::Appender<'_>, StoreError>;

    /// Open for reading from the start
    fn open_read(&self) -> Result<Self::Reader<'_>, StoreError>;
}

/// Open append handle
pub trait LogAppender {
    /// Write one line; the newline is added here
    fn append_line(&mut self, line: &str) -> Result<(), StoreError>;

    /// Flush and release the handle
    fn close(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// Open read handle
pub trait LogReader {
    /// Total store size in bytes at open time
    fn size(&self) -> u64;

    /// Move to an absolute byte offset (clamped to the size)
    fn seek(&mut self, offset: u64) -> Result<(), StoreError>;

    /// Read up to and including the next newline
    ///
    /// The newline and any `\r` are not stored; bytes past the line buffer
    /// capacity are dropped. Returns `Ok(false)` at end of store with nothing
    /// read. A last line without a newline is still returned.
    fn read_line(&mut self, line: &mut LineBuf) -> Result<bool, StoreError>;
}

/// Bytes of one stored line, collected before decoding
///
/// Lines are UTF-8 on the way in but arrive here one byte at a time, and a
/// seek or the length cap can split a character. Decoding happens once per
/// line: invalid sequences become U+FFFD and a character cut off at the end
/// is dropped.
pub(crate) struct RawLine {
    bytes: heapless::Vec<u8, MAX_LINE_LEN>,
    truncated: bool,
}

impl RawLine {
    pub(crate) const fn new() -> Self {
        Self { bytes: heapless::Vec::new(), truncated: false }
    }

    /// Add one byte; `\r` is skipped and bytes past the cap are dropped
    pub(crate) fn push(&mut self, byte: u8) {
        if byte == b'\r' {
            return;
        }
        if self.bytes.push(byte).is_err() {
            self.truncated = true;
        }
    }

    /// Whether bytes were dropped at the cap
    pub(crate) fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Decode into `line`, replacing its contents
    pub(crate) fn decode_into(&self, line: &mut LineBuf) {
        line.clear();
        let mut rest: &[u8] = &self.bytes;
        while !rest.is_empty() {
            match core::str::from_utf8(rest) {
                Ok(text) => {
                    push_clipped(line, text);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    push_clipped(line, core::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(len) => {
                            push_clipped(line, "\u{FFFD}");
                            rest = &after[len..];
                        }
                        // Incomplete character at the end
                        None => break,
                    }
                }
            }
        }
    }
}

fn push_clipped(line: &mut LineBuf, text: &str) {
    if line.push_str(text).is_ok() {
        return;
    }
    for c in text.chars() {
        if line.push(c).is_err() {
            break;
        }
    }
}
