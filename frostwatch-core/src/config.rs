//! Station Configuration
//!
//! Every tunable the station reads at start-up, with defaults from
//! [`crate::constants`]. Loaded from JSON on hosts (`serde_json`), built in
//! code on bare metal.
//!
//! ```rust
//! # #[cfg(feature = "serde_json")]
//! # {
//! use frostwatch_core::StationConfig;
//!
//! let config = StationConfig::from_json(r#"{
//!     "intervals": { "sample_ms": 2000 },
//!     "alert": { "threshold_f": 10.0 }
//! }"#).unwrap();
//!
//! assert_eq!(config.intervals.sample_ms, 2000);
//! assert_eq!(config.intervals.request_ms, 200);   // default kept
//! assert_eq!(config.alert.threshold_f, 10.0);
//! # }
//! ```

use alloc::string::String;

use crate::alert::AlertPolicy;
use crate::connectivity::ReconnectPolicy;
use crate::constants::storage::{LOG_FILE_NAME, MAX_NUM_POINTS};
use crate::constants::time::{
    CONNECTIVITY_CHECK_INTERVAL_MS, DAYLIGHT_OFFSET_SECONDS, GMT_OFFSET_SECONDS,
    REQUEST_SERVICE_INTERVAL_MS, SAMPLE_INTERVAL_MS, STATUS_REPORT_INTERVAL_MS,
    TIME_SYNC_RETRY_INTERVAL_MS,
};
use crate::errors::{StationError, StationResult};
use crate::history::HistoryQuery;

/// Task intervals (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TaskIntervals {
    /// Sample + log
    pub sample_ms: u64,
    /// Link status report
    pub status_ms: u64,
    /// Inbound request service
    pub request_ms: u64,
    /// Connectivity maintenance
    pub connectivity_ms: u64,
    /// Time-sync retry
    pub time_sync_ms: u64,
}

impl Default for TaskIntervals {
    fn default() -> Self {
        Self {
            sample_ms: SAMPLE_INTERVAL_MS,
            status_ms: STATUS_REPORT_INTERVAL_MS,
            request_ms: REQUEST_SERVICE_INTERVAL_MS,
            connectivity_ms: CONNECTIVITY_CHECK_INTERVAL_MS,
            time_sync_ms: TIME_SYNC_RETRY_INTERVAL_MS,
        }
    }
}

/// Wall-clock offsets (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClockOffsets {
    /// Offset from GMT
    pub gmt_offset_s: i32,
    /// Additional daylight-saving offset
    pub daylight_offset_s: i32,
}

impl Default for ClockOffsets {
    fn default() -> Self {
        Self { gmt_offset_s: GMT_OFFSET_SECONDS, daylight_offset_s: DAYLIGHT_OFFSET_SECONDS }
    }
}

/// Complete station configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StationConfig {
    /// Task intervals
    pub intervals: TaskIntervals,
    /// History read parameters
    pub history: HistoryQuery,
    /// Alert threshold and cool-down
    pub alert: AlertPolicy,
    /// Reconnect timing
    pub reconnect: ReconnectPolicy,
    /// Wall-clock offsets
    pub clock: ClockOffsets,
    /// Log file path (file-backed stores only)
    pub log_path: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            intervals: TaskIntervals::default(),
            history: HistoryQuery::default(),
            alert: AlertPolicy::default(),
            reconnect: ReconnectPolicy::default(),
            clock: ClockOffsets::default(),
            log_path: String::from(LOG_FILE_NAME),
        }
    }
}

impl StationConfig {
    /// Parse from JSON; missing fields take their defaults
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> StationResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            log_error!("Rejected station config: {}", e);
            StationError::InvalidConfig { reason: "malformed JSON" }
        })
    }

    /// Serialize to JSON
    #[cfg(feature = "serde_json")]
    pub fn to_json(&self) -> StationResult<String> {
        serde_json::to_string(self)
            .map_err(|_| StationError::InvalidConfig { reason: "not serializable" })
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> StationResult<()> {
        let i = &self.intervals;
        if i.sample_ms == 0
            || i.status_ms == 0
            || i.request_ms == 0
            || i.connectivity_ms == 0
            || i.time_sync_ms == 0
        {
            return Err(StationError::InvalidConfig { reason: "task interval must be non-zero" });
        }
        if self.history.num_points == 0 || self.history.average_line_length == 0 {
            return Err(StationError::InvalidConfig { reason: "history parameters must be non-zero" });
        }
        if self.history.num_points > MAX_NUM_POINTS {
            return Err(StationError::InvalidConfig { reason: "history point budget too large" });
        }
        if self.reconnect.poll_interval_ms == 0 {
            return Err(StationError::InvalidConfig { reason: "reconnect poll interval must be non-zero" });
        }
        if u64::from(self.reconnect.poll_interval_ms) > self.reconnect.timeout_ms {
            return Err(StationError::InvalidConfig { reason: "reconnect poll interval exceeds timeout" });
        }
        if self.alert.threshold_f.is_nan() {
            return Err(StationError::InvalidConfig { reason: "alert threshold is NaN" });
        }
        Ok(())
    }

    /// Set the sampling interval
    pub fn with_sample_interval(mut self, ms: u64) -> Self {
        self.intervals.sample_ms = ms;
        self
    }

    /// Set all task intervals
    pub fn with_intervals(mut self, intervals: TaskIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    /// Set history read parameters
    pub fn with_history(mut self, history: HistoryQuery) -> Self {
        self.history = history;
        self
    }

    /// Set alert policy
    pub fn with_alert(mut self, alert: AlertPolicy) -> Self {
        self.alert = alert;
        self
    }

    /// Set reconnect timing
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Set wall-clock offsets
    pub fn with_clock_offsets(mut self, gmt_offset_s: i32, daylight_offset_s: i32) -> Self {
        self.clock = ClockOffsets { gmt_offset_s, daylight_offset_s };
        self
    }

    /// Set log file path
    pub fn with_log_path(mut self, path: impl Into<String>) -> Self {
        self.log_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_reference_values() {
        let config = StationConfig::default();
        assert_eq!(config.intervals.sample_ms, 1000);
        assert_eq!(config.intervals.status_ms, 5000);
        assert_eq!(config.intervals.request_ms, 200);
        assert_eq!(config.intervals.connectivity_ms, 10_000);
        assert_eq!(config.history.skip_interval, 600);
        assert_eq!(config.alert.cooldown_ms, 3_600_000);
        assert_eq!(config.log_path, "data_log.txt");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validation_rejects_zero_interval() {
        let config = StationConfig::default().with_sample_interval(0);
        assert!(matches!(config.validate(), Err(StationError::InvalidConfig { .. })));
    }

    #[test]
    fn validation_rejects_poll_longer_than_timeout() {
        let config = StationConfig::default().with_reconnect(ReconnectPolicy {
            timeout_ms: 100,
            poll_interval_ms: 500,
            settle_ms: 0,
        });
        assert_eq!(
            config.validate(),
            Err(StationError::InvalidConfig { reason: "reconnect poll interval exceeds timeout" })
        );
    }

    #[test]
    fn validation_rejects_oversized_point_budget() {
        let at_cap = StationConfig::default().with_history(HistoryQuery::default().with_num_points(MAX_NUM_POINTS));
        assert_eq!(at_cap.validate(), Ok(()));

        let over = StationConfig::default().with_history(HistoryQuery::default().with_num_points(u32::MAX));
        assert_eq!(
            over.validate(),
            Err(StationError::InvalidConfig { reason: "history point budget too large" })
        );
    }

    #[test]
    fn zero_skip_interval_is_allowed() {
        let config = StationConfig::default().with_history(HistoryQuery::default().with_skip_interval(0));
        assert_eq!(config.validate(), Ok(()));
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn json_partial_and_round_trip() {
        let config = StationConfig::from_json(
            r#"{ "history": { "partial_line": "discard" }, "log_path": "/tmp/log.txt" }"#,
        )
        .unwrap();
        assert_eq!(config.history.partial_line, crate::history::PartialLinePolicy::Discard);
        assert_eq!(config.history.num_points, 100);
        assert_eq!(config.log_path, "/tmp/log.txt");

        let json = config.to_json().unwrap();
        assert_eq!(StationConfig::from_json(&json).unwrap(), config);
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn malformed_json_is_invalid_config() {
        assert_eq!(
            StationConfig::from_json("{ not json"),
            Err(StationError::InvalidConfig { reason: "malformed JSON" })
        );
    }
}
