//! Error Types for the Monitor Core
//!
//! ## Design Philosophy
//!
//! Errors are returned from task actions on every scheduler pass, so they are
//! kept small and `Copy`: no `String`, only `&'static str` reasons and plain
//! integers. Every variant except [`StationError::StoreMountFailed`] is
//! absorbed locally; the scheduler logs it, counts it against the task and
//! retries on the task's next interval.
//!
//! ## Error Categories
//!
//! ### Storage
//! - `StoreUnavailable`: the log store could not be opened for append or read.
//!   A flush becomes a no-op (that batch is lost), a history read yields the
//!   "No data available" sentinel.
//! - `StoreMountFailed`: the store is unusable at start-up. This is the only
//!   error allowed to halt the system.
//!
//! ### Environment
//! - `ConnectivityLost`: the link stayed down for a whole reconnect window.
//! - `TimeSyncFailure`: no wall-clock time; timestamps degrade to a sentinel.
//! - `SensorReadFailure`: the sensor returned nothing usable; the record is
//!   still logged with a `nan` field.
//!
//! ### Collaborators
//! - `AlertDeliveryFailed`: the mailer rejected an alert; never retried within
//!   the same invocation.
//! - `RequestFailed`: I/O with an inbound peer failed mid-exchange.
//!
//! ### Setup
//! - `TaskTableFull`, `InvalidConfig`.
//!
//! ```rust
//! use frostwatch_core::StationError;
//!
//! fn absorb(result: Result<(), StationError>) -> bool {
//!     match result {
//!         Ok(()) => true,
//!         Err(StationError::StoreMountFailed { .. }) => false, // halt
//!         Err(_) => true, // logged, retried next pass
//!     }
//! }
//! # assert!(absorb(Err(StationError::TimeSyncFailure)));
//! ```

use thiserror_no_std::Error;

use crate::service::ServiceError;
use crate::store::StoreError;

/// Result type for station operations
pub type StationResult<T> = Result<T, StationError>;

/// Station errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum StationError {
    /// Log store could not be opened for append or read
    #[error("Log store unavailable: {reason}")]
    StoreUnavailable {
        /// What the store was being opened for
        reason: &'static str,
    },

    /// Log store unusable at start-up
    #[error("Log store mount failed: {reason}")]
    StoreMountFailed {
        /// Why mounting failed
        reason: &'static str,
    },

    /// Link still down after a full reconnect window
    #[error("Connectivity lost, gave up after {waited_ms} ms")]
    ConnectivityLost {
        /// Time spent polling the link before giving up
        waited_ms: u64,
    },

    /// Wall clock not synchronized
    #[error("Time synchronization failed")]
    TimeSyncFailure,

    /// Sensor produced no usable value
    #[error("Sensor read failed: {reason}")]
    SensorReadFailure {
        /// Which quantity failed
        reason: &'static str,
    },

    /// Mailer could not deliver an alert
    #[error("Alert delivery failed: {reason}")]
    AlertDeliveryFailed {
        /// Transport-level reason
        reason: &'static str,
    },

    /// Inbound request could not be served
    #[error("Request failed: {reason}")]
    RequestFailed {
        /// Which step of the exchange failed
        reason: &'static str,
    },

    /// No room left in the scheduling table
    #[error("Task table full: capacity {capacity}")]
    TaskTableFull {
        /// Maximum number of tasks
        capacity: usize,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Which setting was rejected
        reason: &'static str,
    },
}

impl StationError {
    /// Whether this error should halt start-up
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreMountFailed { .. })
    }
}

impl From<StoreError> for StationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotMounted => Self::StoreMountFailed { reason: "store not mounted" },
            StoreError::Unavailable { operation } => Self::StoreUnavailable { reason: operation },
            StoreError::Io { operation } => Self::StoreUnavailable { reason: operation },
        }
    }
}

impl From<ServiceError> for StationError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Io { operation } => Self::RequestFailed { reason: operation },
            ServiceError::Closed => Self::RequestFailed { reason: "peer closed connection" },
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::StoreUnavailable { reason } =>
                defmt::write!(fmt, "Store unavailable: {}", reason),
            Self::StoreMountFailed { reason } =>
                defmt::write!(fmt, "Store mount failed: {}", reason),
            Self::ConnectivityLost { waited_ms } =>
                defmt::write!(fmt, "Connectivity lost after {} ms", waited_ms),
            Self::TimeSyncFailure =>
                defmt::write!(fmt, "Time sync failed"),
            Self::SensorReadFailure { reason } =>
                defmt::write!(fmt, "Sensor read failed: {}", reason),
            Self::AlertDeliveryFailed { reason } =>
                defmt::write!(fmt, "Alert delivery failed: {}", reason),
            Self::RequestFailed { reason } =>
                defmt::write!(fmt, "Request failed: {}", reason),
            Self::TaskTableFull { capacity } =>
                defmt::write!(fmt, "Task table full ({})", capacity),
            Self::InvalidConfig { reason } =>
                defmt::write!(fmt, "Invalid config: {}", reason),
        }
    }
}
