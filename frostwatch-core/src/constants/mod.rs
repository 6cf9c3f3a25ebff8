//! Constants for Frostwatch Core
//!
//! Centralized reference values for the monitor. Every numeric value the
//! scheduler, buffer, reader and alert gate use by default is defined here.
//!
//! ## Organization
//!
//! - **Time**: task intervals, timeouts, clock offsets
//! - **Buffers**: fixed capacities for RAM-resident structures
//! - **Storage**: log file and history read parameters
//! - **Alert**: threshold and cool-down
//!
//! ## Usage Guidelines
//!
//! 1. Use these constants instead of magic numbers
//! 2. Runtime-tunable values also appear in [`crate::config::StationConfig`],
//!    whose defaults come from here

/// Time-related constants for intervals, timeouts, and clock offsets.
pub mod time;

/// Buffer sizes and memory constraints.
pub mod buffers;

/// Log store and history read parameters.
pub mod storage;

/// Alert threshold and cool-down.
pub mod alert;

// Re-export commonly used constants for convenience
pub use time::{
    MS_PER_SECOND, MS_PER_HOUR,
    SAMPLE_INTERVAL_MS, STATUS_REPORT_INTERVAL_MS, REQUEST_SERVICE_INTERVAL_MS,
    CONNECTIVITY_CHECK_INTERVAL_MS, TIME_SYNC_RETRY_INTERVAL_MS,
    RECONNECT_TIMEOUT_MS, RECONNECT_POLL_INTERVAL_MS,
};

pub use buffers::{
    LOG_BUFFER_CAPACITY, MAX_LINE_LEN, TIMESTAMP_CAPACITY, MAX_REQUEST_LINE, MAX_TASKS,
};

pub use storage::{
    AVERAGE_LINE_LENGTH, SKIP_INTERVAL, NUM_POINTS, MAX_NUM_POINTS, NO_DATA_SENTINEL,
    SERIES_LINE_MARKER,
};

pub use alert::{FREEZER_THRESHOLD_F, ALERT_COOLDOWN_MS, ALERT_SUBJECT};
