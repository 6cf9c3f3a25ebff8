//! Log Store and History Read Constants

/// Default log file name.
pub const LOG_FILE_NAME: &str = "data_log.txt";

/// Estimated bytes per stored line.
///
/// Used only to turn a point budget into a byte offset. A typical line
/// `2024-01-01 00:00:00,-4.2,61.0,12.34,-67` is ~40 bytes plus newline.
pub const AVERAGE_LINE_LENGTH: u32 = 50;

/// Default decimation stride (lines).
///
/// At one line per second this keeps one point every ten minutes.
pub const SKIP_INTERVAL: u32 = 600;

/// Default number of points in a history series.
///
/// 100 points × 10 minutes ≈ 16.7 hours of history.
pub const NUM_POINTS: u32 = 100;

/// Largest accepted point budget.
///
/// A series holds at most `MAX_NUM_POINTS + 1` lines of up to
/// `MAX_LINE_LEN` bytes each, about 256 KB.
pub const MAX_NUM_POINTS: u32 = 1000;

/// Series returned when nothing can be read.
pub const NO_DATA_SENTINEL: &str = "No data available";

/// Separator marker between series lines.
///
/// A literal backslash followed by `n`: the payload is embedded in a
/// JavaScript template literal, which turns the marker into a newline.
pub const SERIES_LINE_MARKER: &str = "\\n";

/// Text written for a non-finite field.
pub const NAN_FIELD: &str = "nan";

/// Timestamp written when the wall clock is not synchronized.
pub const TIME_ERROR_TIMESTAMP: &str = "Time Error!";
