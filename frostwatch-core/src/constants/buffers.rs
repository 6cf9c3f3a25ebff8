//! Buffer Sizes and Memory Constraints
//!
//! Fixed capacities for everything that lives in RAM. The reference target is
//! an ESP32-class board, so each bound is chosen to keep the worst case well
//! under a few tens of kilobytes.

/// Write buffer capacity (records).
///
/// Records are batched this many at a time before a single append-mode
/// open of the store:
/// - 10 records × ~64 bytes = ~640 bytes of RAM
/// - One store open every 10 seconds at the reference sample rate
///
/// A power loss between fill and flush loses at most this many readings.
pub const LOG_BUFFER_CAPACITY: usize = 10;

/// Maximum stored line length (bytes).
///
/// Reference lines are ~50 bytes; longer lines are truncated on read.
pub const MAX_LINE_LEN: usize = 256;

/// Timestamp text capacity (bytes).
///
/// `YYYY-MM-DD HH:MM:SS` is 19 bytes; the rest is headroom.
pub const TIMESTAMP_CAPACITY: usize = 32;

/// Maximum inbound request line (bytes).
///
/// The line is read and discarded; anything past this is never read.
pub const MAX_REQUEST_LINE: usize = 1024;

/// Scheduling table capacity (tasks).
pub const MAX_TASKS: usize = 8;

/// Store read chunk size (bytes).
pub const READ_CHUNK_SIZE: usize = 512;
