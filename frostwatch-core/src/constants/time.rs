//! Time-Related Constants
//!
//! Task intervals, timeouts and clock offsets used by the scheduler and the
//! connectivity supervisor. All durations are milliseconds unless the name
//! says otherwise.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Minutes per hour.
pub const MINUTES_PER_HOUR: u32 = 60;

/// Seconds per hour.
pub const SECONDS_PER_HOUR: u32 = SECONDS_PER_MINUTE * MINUTES_PER_HOUR;

/// Milliseconds per hour.
pub const MS_PER_HOUR: u64 = MS_PER_SECOND * SECONDS_PER_HOUR as u64;

// ===== TASK INTERVALS =====

/// Sample + log interval (milliseconds).
///
/// One reading per second. Ten of them fill the write buffer, so the store
/// sees one batched append every ten seconds.
pub const SAMPLE_INTERVAL_MS: u64 = 1000;

/// Connectivity status report interval (milliseconds).
pub const STATUS_REPORT_INTERVAL_MS: u64 = 5000;

/// Inbound request service interval (milliseconds).
///
/// A peer waits at most this long before its connection is accepted.
pub const REQUEST_SERVICE_INTERVAL_MS: u64 = 200;

/// Connectivity maintenance check interval (milliseconds).
pub const CONNECTIVITY_CHECK_INTERVAL_MS: u64 = 10000;

/// Time-sync retry interval (milliseconds).
///
/// Only relevant until the wall clock has synchronized once.
pub const TIME_SYNC_RETRY_INTERVAL_MS: u64 = 5000;

// ===== TIMEOUT VALUES =====

/// Reconnect window (milliseconds).
///
/// Upper bound on how long a reconnect attempt blocks the whole loop.
/// Every other task's effective interval grows by up to this much while the
/// link is down.
pub const RECONNECT_TIMEOUT_MS: u64 = 10000;

/// Reconnect poll interval (milliseconds).
pub const RECONNECT_POLL_INTERVAL_MS: u32 = 500;

/// Settle delay before re-associating (milliseconds).
pub const RECONNECT_SETTLE_MS: u32 = 100;

/// Read timeout for an inbound request line (milliseconds).
pub const REQUEST_READ_TIMEOUT_MS: u64 = 1000;

// ===== CLOCK OFFSETS =====

/// Offset from GMT in seconds (CST, GMT-6).
pub const GMT_OFFSET_SECONDS: i32 = -21_600;

/// Daylight saving offset in seconds.
pub const DAYLIGHT_OFFSET_SECONDS: i32 = 3600;

/// Earliest Unix time (seconds) treated as a synchronized wall clock.
///
/// A clock that has never been set reads as 1970; anything before
/// 2016-01-01 means no time source has reached the device yet.
pub const MIN_SYNCED_UNIX_SECONDS: i64 = 1_451_606_400;
