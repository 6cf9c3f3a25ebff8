//! Time Source Abstraction
//!
//! Three separate concerns, three traits:
//!
//! - [`TimeSource`]: monotonic milliseconds. Drives the scheduler and
//!   measures reconnect windows.
//! - [`Delay`]: explicit bounded blocking. The only way a task may suspend.
//! - [`WallClock`]: calendar time for record timestamps. May be unavailable
//!   until a network time source has been reached.
//!
//! Keeping them apart lets tests drive the scheduler with a synthetic clock
//! whose `delay_ms` simply advances time, so a 10 s reconnect window runs in
//! microseconds.

use chrono::NaiveDateTime;

use crate::time::Timestamp;

/// Source of monotonic time for the system
///
/// ## Implementation Requirements
///
/// - `now()` should never go backwards; the scheduler tolerates it by
///   treating negative elapsed time as zero
///
/// ## Example Implementation
///
/// ```rust
/// use frostwatch_core::traits::TimeSource;
/// use frostwatch_core::time::Timestamp;
///
/// struct TickCounter {
///     ticks: u64,
/// }
///
/// impl TimeSource for TickCounter {
///     fn now(&self) -> Timestamp {
///         self.ticks // 1 kHz tick
///     }
/// }
/// ```
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    ///
    /// Monotonic sources count from boot; test sources from an arbitrary
    /// starting point.
    fn now(&self) -> Timestamp;
}

/// Bounded blocking delay
///
/// Every call blocks the whole scheduler for `ms` milliseconds.
pub trait Delay {
    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

/// Calendar time source
pub trait WallClock {
    /// Current local time, or `None` while unsynchronized
    fn local_time(&self) -> Option<NaiveDateTime>;
}
