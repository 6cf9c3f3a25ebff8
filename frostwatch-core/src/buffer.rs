//! Bounded Write Buffer for Pending Log Records
//!
//! ## Overview
//!
//! Samples arrive once a second but the log store is slow to open (an SD card
//! on the reference board). The write buffer batches records in RAM and hands
//! them to the store as one unit: one append-mode open, `N` lines, one close.
//!
//! ```text
//! append ──► [r0 r1 r2 ... r(N-1)] ──len == N──► flush ──► store
//!                                                  │
//!                                                  └──► clear (len = 0)
//! ```
//!
//! ## Invariants
//!
//! - `len <= N` at all times
//! - Records are written in insertion order
//! - After a flush, successful or not, the buffer is empty
//!
//! ### Why not a ring buffer?
//!
//! Nothing may be overwritten silently: a full buffer means "write now", not
//! "forget the oldest". A `heapless::Vec` with reset-on-flush expresses that
//! directly and needs no index arithmetic.
//!
//! ## Failure Behaviour
//!
//! If the store cannot be opened the batch is dropped, an error is logged and
//! the [`StoreError`] is returned to the caller. Losing one batch is preferred
//! over growing without bound while the card is missing.
//!
//! ## Usage Example
//!
//! ```rust
//! use frostwatch_core::buffer::WriteBuffer;
//! use frostwatch_core::record::LogRecord;
//! use frostwatch_core::store::{LogStore, MemoryLogStore};
//!
//! let mut store = MemoryLogStore::new();
//! store.mount().unwrap();
//!
//! let mut buffer: WriteBuffer<2> = WriteBuffer::new();
//! buffer.append(LogRecord::new("a", 1.0, 2.0, 0.0, -60), &mut store).unwrap();
//! assert_eq!(buffer.len(), 1);
//!
//! // Second append fills the buffer and flushes it
//! let flushed = buffer.append(LogRecord::new("b", 1.0, 2.0, 0.0, -60), &mut store).unwrap();
//! assert_eq!(flushed, Some(2));
//! assert!(buffer.is_empty());
//! assert_eq!(store.lines().len(), 2);
//! ```

use crate::record::LogRecord;
use crate::store::{LogAppender, LogStore, StoreError};

/// Flush statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushStats {
    /// Flushes attempted
    pub flushes: u32,
    /// Records written to the store
    pub records_written: u32,
    /// Records lost to failed flushes
    pub records_dropped: u32,
    /// Flushes that failed
    pub failed_flushes: u32,
}

/// Fixed-capacity batch of records awaiting the log store
///
/// ## Type Parameter
///
/// - `N`: records per batch. Also the most records a power loss can cost.
#[derive(Debug, Clone)]
pub struct WriteBuffer<const N: usize> {
    records: heapless::Vec<LogRecord, N>,
    stats: FlushStats,
}

impl<const N: usize> Default for WriteBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> WriteBuffer<N> {
    /// Empty buffer
    pub const fn new() -> Self {
        Self {
            records: heapless::Vec::new(),
            stats: FlushStats { flushes: 0, records_written: 0, records_dropped: 0, failed_flushes: 0 },
        }
    }

    /// Add a record, flushing if this fills the buffer
    ///
    /// Returns `Ok(Some(n))` when a flush wrote `n` records, `Ok(None)` when
    /// the record was only buffered.
    pub fn append<S: LogStore>(
        &mut self,
        record: LogRecord,
        store: &mut S,
    ) -> Result<Option<usize>, StoreError> {
        if let Err(record) = self.records.push(record) {
            // Only reachable with N == 0: nothing can be buffered, so the record is dropped
            log_warn!("Write buffer has no capacity, dropping record {}", record.timestamp.as_str());
            self.stats.records_dropped += 1;
            return Ok(None);
        }

        if self.records.len() == N {
            self.flush(store).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Write all pending records and clear the buffer
    ///
    /// The buffer is cleared even when the store fails; the batch is lost.
    pub fn flush<S: LogStore>(&mut self, store: &mut S) -> Result<usize, StoreError> {
        if self.records.is_empty() {
            return Ok(0);
        }

        self.stats.flushes += 1;
        let count = self.records.len();
        let result = write_batch(&self.records, store);
        self.records.clear();

        match result {
            Ok(()) => {
                self.stats.records_written += count as u32;
                log_debug!("Flushed {} records to log store", count);
                Ok(count)
            }
            Err(err) => {
                self.stats.failed_flushes += 1;
                self.stats.records_dropped += count as u32;
                log_error!("Failed to flush {} records: {}", count, err);
                Err(err)
            }
        }
    }

    /// Number of pending records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check if the next append will flush
    pub fn is_full(&self) -> bool {
        self.records.len() == N
    }

    /// Records per batch
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Pending records, oldest first
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Flush statistics
    pub fn stats(&self) -> &FlushStats {
        &self.stats
    }
}

fn write_batch<S: LogStore>(records: &[LogRecord], store: &mut S) -> Result<(), StoreError> {
    let mut appender = store.open_append()?;
    for record in records {
        appender.append_line(&record.to_line())?;
    }
    appender.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLogStore;

    fn record(ts: &str, temp: f32) -> LogRecord {
        LogRecord::new(ts, temp, 50.0, 1.0, -60)
    }

    fn mounted() -> MemoryLogStore {
        let mut store = MemoryLogStore::new();
        store.mount().unwrap();
        store
    }

    #[test]
    fn buffers_until_full() {
        let mut store = mounted();
        let mut buffer: WriteBuffer<3> = WriteBuffer::new();

        assert_eq!(buffer.append(record("a", 1.0), &mut store), Ok(None));
        assert_eq!(buffer.append(record("b", 2.0), &mut store), Ok(None));
        assert_eq!(buffer.len(), 2);
        assert_eq!(store.size(), 0);

        assert_eq!(buffer.append(record("c", 3.0), &mut store), Ok(Some(3)));
        assert!(buffer.is_empty());
        assert_eq!(
            store.lines(),
            vec!["a,1.0,50.0,1.00,-60", "b,2.0,50.0,1.00,-60", "c,3.0,50.0,1.00,-60"]
        );
    }

    #[test]
    fn manual_flush_of_partial_buffer() {
        let mut store = mounted();
        let mut buffer: WriteBuffer<10> = WriteBuffer::new();
        buffer.append(record("a", 98.6), &mut store).unwrap();

        assert_eq!(buffer.flush(&mut store), Ok(1));
        assert!(buffer.is_empty());
        assert_eq!(store.lines(), vec!["a,98.6,50.0,1.00,-60"]);

        // Nothing pending: no store access at all
        store.set_available(false);
        assert_eq!(buffer.flush(&mut store), Ok(0));
    }

    #[test]
    fn failed_flush_drops_batch_and_resets() {
        let mut store = mounted();
        store.set_available(false);
        let mut buffer: WriteBuffer<2> = WriteBuffer::new();

        buffer.append(record("a", 1.0), &mut store).unwrap();
        let result = buffer.append(record("b", 2.0), &mut store);
        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
        assert!(buffer.is_empty());
        assert_eq!(buffer.stats().records_dropped, 2);
        assert_eq!(buffer.stats().failed_flushes, 1);

        // Store back: the next batch is written normally
        store.set_available(true);
        buffer.append(record("c", 3.0), &mut store).unwrap();
        buffer.append(record("d", 4.0), &mut store).unwrap();
        assert_eq!(store.lines().len(), 2);
        assert_eq!(buffer.stats().records_written, 2);
    }

    #[test]
    fn pending_records_in_order() {
        let mut store = mounted();
        let mut buffer: WriteBuffer<4> = WriteBuffer::new();
        buffer.append(record("a", 1.0), &mut store).unwrap();
        buffer.append(record("b", 2.0), &mut store).unwrap();

        let names: Vec<&str> = buffer.records().iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(buffer.capacity(), 4);
        assert!(!buffer.is_full());
    }

    #[test]
    fn zero_capacity_drops_records() {
        let mut store = mounted();
        let mut buffer: WriteBuffer<0> = WriteBuffer::new();

        assert_eq!(buffer.append(record("a", 1.0), &mut store), Ok(None));
        assert!(store.lines().is_empty());
        assert_eq!(buffer.stats().records_dropped, 1);
    }
}
