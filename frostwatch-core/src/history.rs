//! Bounded-Memory Historical Reader
//!
//! Produces a decimated series from the tail of the log store without ever
//! holding more than one line (plus the bounded output) in memory.
//!
//! ## Algorithm
//!
//! ```text
//! window     = num_points × skip_interval × average_line_length
//! start_byte = max(0, size - window)              (saturating)
//!
//! seek(start_byte)
//! for each line, counter i = 0, 1, 2, ...:
//!     keep the line when i % skip_interval == 0
//! join kept lines with the "\n" marker
//! ```
//!
//! `start_byte` usually lands mid-line. [`PartialLinePolicy`] decides whether
//! that first fragment counts as line 0 (`Keep`) or is skipped (`Discard`).
//!
//! The window is an estimate. If real lines are shorter than
//! `average_line_length` the stride yields more than `num_points + 1` lines;
//! the oldest are dropped so the output stays bounded and covers the tail.

use alloc::collections::VecDeque;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::constants::storage::{
    AVERAGE_LINE_LENGTH, MAX_NUM_POINTS, NO_DATA_SENTINEL, NUM_POINTS, SERIES_LINE_MARKER,
    SKIP_INTERVAL,
};
use crate::record::LineBuf;
use crate::store::{LogReader, LogStore, StoreError};

/// What to do with the line fragment at `start_byte`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PartialLinePolicy {
    /// Count the fragment as line 0 and emit it
    #[default]
    Keep,
    /// Skip to the first complete line after `start_byte`
    Discard,
}

/// Parameters for one history read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HistoryQuery {
    /// Target number of points
    pub num_points: u32,
    /// Keep one line in this many (0 is treated as 1)
    pub skip_interval: u32,
    /// Estimated bytes per line
    pub average_line_length: u32,
    /// Handling of the fragment at the start offset
    pub partial_line: PartialLinePolicy,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            num_points: NUM_POINTS,
            skip_interval: SKIP_INTERVAL,
            average_line_length: AVERAGE_LINE_LENGTH,
            partial_line: PartialLinePolicy::Keep,
        }
    }
}

impl HistoryQuery {
    /// Set number of points
    pub fn with_num_points(mut self, num_points: u32) -> Self {
        self.num_points = num_points;
        self
    }

    /// Set decimation stride
    pub fn with_skip_interval(mut self, skip_interval: u32) -> Self {
        self.skip_interval = skip_interval;
        self
    }

    /// Set line length estimate
    pub fn with_average_line_length(mut self, average_line_length: u32) -> Self {
        self.average_line_length = average_line_length;
        self
    }

    /// Set partial-line policy
    pub fn with_partial_line(mut self, policy: PartialLinePolicy) -> Self {
        self.partial_line = policy;
        self
    }

    /// Stride with 0 mapped to 1
    pub fn effective_stride(&self) -> u64 {
        u64::from(self.skip_interval.max(1))
    }

    /// Upper bound on lines in the output
    ///
    /// The point budget is capped at [`MAX_NUM_POINTS`] here as well as in
    /// config validation, so a query built in code stays bounded.
    pub fn max_lines(&self) -> usize {
        usize::try_from(self.num_points.min(MAX_NUM_POINTS))
            .unwrap_or(usize::MAX)
            .saturating_add(1)
    }

    /// Bytes of the store's tail this query looks at
    pub fn window_bytes(&self) -> u64 {
        u64::from(self.num_points)
            .saturating_mul(self.effective_stride())
            .saturating_mul(u64::from(self.average_line_length))
    }
}

/// Byte offset to start reading a store of `size` bytes
///
/// Always within `[0, size]`.
pub fn start_byte(size: u64, query: &HistoryQuery) -> u64 {
    size.saturating_sub(query.window_bytes())
}

/// A decimated series read from the store
///
/// Lines are kept separately so a line that itself contains the two-character
/// marker survives [`Series::iter`] intact; [`Series::payload`] joins them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    lines: Vec<String>,
    start_byte: u64,
    lines_scanned: u64,
    dropped: u64,
}

impl Series {
    fn sentinel(start_byte: u64, lines_scanned: u64) -> Self {
        Self { lines: Vec::new(), start_byte, lines_scanned, dropped: 0 }
    }

    /// Marker-joined payload, or the "No data available" sentinel
    pub fn payload(&self) -> String {
        self.to_string()
    }

    /// Number of lines in the series
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if no line was selected
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the payload is the no-data sentinel
    pub fn is_sentinel(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate over the selected lines, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Offset reading started at
    pub fn start_byte(&self) -> u64 {
        self.start_byte
    }

    /// Lines read from the store, selected or not
    pub fn lines_scanned(&self) -> u64 {
        self.lines_scanned
    }

    /// Selected lines dropped to respect the output bound
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl core::fmt::Display for Series {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_sentinel() {
            return f.write_str(NO_DATA_SENTINEL);
        }
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                f.write_str(SERIES_LINE_MARKER)?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Stride-sampling reader over a [`LogStore`]
///
/// ## Example
///
/// ```rust
/// use frostwatch_core::history::{HistoricalReader, HistoryQuery};
/// use frostwatch_core::store::MemoryLogStore;
///
/// let store = MemoryLogStore::with_contents("a\nb\nc\nd\ne\n");
/// let reader = HistoricalReader::new(HistoryQuery::default().with_skip_interval(2));
///
/// let series = reader.read_series(&store);
/// assert_eq!(series.payload(), "a\\nc\\ne");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoricalReader {
    query: HistoryQuery,
}

impl HistoricalReader {
    /// Reader for `query`
    pub fn new(query: HistoryQuery) -> Self {
        Self { query }
    }

    /// Active query
    pub fn query(&self) -> &HistoryQuery {
        &self.query
    }

    /// Read the decimated tail of `store`
    ///
    /// Never fails: an unavailable store, an I/O error before anything was
    /// selected, or an empty store all yield the sentinel series.
    pub fn read_series<S: LogStore>(&self, store: &S) -> Series {
        let mut reader = match store.open_read() {
            Ok(reader) => reader,
            Err(err) => {
                log_warn!("History read skipped: {}", err);
                return Series::sentinel(0, 0);
            }
        };

        let size = reader.size();
        let start = start_byte(size, &self.query);
        if size == 0 {
            return Series::sentinel(start, 0);
        }

        match self.collect(&mut reader, start) {
            Ok(series) => series,
            Err(err) => {
                log_warn!("History read failed: {}", err);
                Series::sentinel(start, 0)
            }
        }
    }

    fn collect<R: LogReader>(&self, reader: &mut R, start: u64) -> Result<Series, StoreError> {
        let stride = self.query.effective_stride();
        let max_lines = self.query.max_lines();
        let mut line = LineBuf::new();

        if start > 0 && self.query.partial_line == PartialLinePolicy::Discard {
            // Byte before start: consuming through its line lands on a line boundary
            reader.seek(start - 1)?;
            reader.read_line(&mut line)?;
        } else {
            reader.seek(start)?;
        }

        let mut selected: VecDeque<LineBuf> = VecDeque::with_capacity(max_lines.min(128));
        let mut line_count: u64 = 0;
        let mut dropped: u64 = 0;

        while reader.read_line(&mut line)? {
            let keep = line_count % stride == 0;
            line_count += 1;
            if !keep {
                continue;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if selected.len() == max_lines {
                selected.pop_front();
                dropped += 1;
            }
            let mut kept = LineBuf::new();
            // Trimmed text is never longer than the source buffer
            let _ = kept.push_str(trimmed);
            selected.push_back(kept);
        }

        if selected.is_empty() {
            return Ok(Series::sentinel(start, line_count));
        }

        if dropped > 0 {
            log_debug!("History output bounded: dropped {} oldest lines", dropped);
        }

        let lines = selected.iter().map(|kept| String::from(kept.as_str())).collect();
        Ok(Series { lines, start_byte: start, lines_scanned: line_count, dropped })
    }
}
