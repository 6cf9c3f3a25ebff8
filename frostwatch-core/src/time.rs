//! Time management for the monitor
//!
//! Provides the clock implementations behind the traits in
//! [`crate::traits::time`]:
//! - System monotonic clock and blocking delay (std)
//! - System wall clock with a fixed GMT + daylight offset (std)
//! - Mock clock whose delays advance time, for deterministic tests
//!
//! Also owns the timestamp text written into every record, and the
//! time-sync check that retries until the wall clock has been set once.

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt::Write;

use chrono::NaiveDateTime;

use crate::constants::storage::TIME_ERROR_TIMESTAMP;
use crate::errors::{StationError, StationResult};
use crate::record::TimestampText;

pub use crate::traits::time::{Delay, TimeSource, WallClock};

/// Timestamp in milliseconds since device boot (or an arbitrary test epoch)
pub type Timestamp = u64;

/// Wall-clock format used for record timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Monotonic time source backed by `std::time::Instant`
///
/// Starts at 0 when created, always increases.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Start counting from now
    pub fn new() -> Self {
        Self { start: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }
}

/// Blocking delay using `std::thread::sleep`
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

/// System wall clock shifted by a fixed offset
///
/// Reports `None` until the system time is plausible, i.e. some time source
/// has set it (see [`crate::constants::time::MIN_SYNCED_UNIX_SECONDS`]).
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SystemWallClock {
    offset_seconds: i32,
}

#[cfg(feature = "std")]
impl SystemWallClock {
    /// Create clock with GMT and daylight offsets in seconds
    pub fn new(gmt_offset_seconds: i32, daylight_offset_seconds: i32) -> Self {
        Self { offset_seconds: gmt_offset_seconds.saturating_add(daylight_offset_seconds) }
    }

    /// Create clock from configured offsets
    pub fn from_offsets(offsets: &crate::config::ClockOffsets) -> Self {
        Self::new(offsets.gmt_offset_s, offsets.daylight_offset_s)
    }

    /// Total offset from UTC in seconds
    pub fn offset_seconds(&self) -> i32 {
        self.offset_seconds
    }
}

#[cfg(feature = "std")]
impl WallClock for SystemWallClock {
    fn local_time(&self) -> Option<NaiveDateTime> {
        let now = chrono::Utc::now();
        if now.timestamp() < crate::constants::time::MIN_SYNCED_UNIX_SECONDS {
            return None;
        }
        let offset = chrono::FixedOffset::east_opt(self.offset_seconds)?;
        Some(now.with_timezone(&offset).naive_local())
    }
}

/// Controllable time source for testing
///
/// Clones share the same counter, so one handle can drive the scheduler while
/// another is handed to the station as its [`Delay`]: every delay advances
/// the shared clock instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct MockTimeSource {
    now: Rc<Cell<Timestamp>>,
}

impl MockTimeSource {
    /// Create mock clock starting at `start`
    pub fn new(start: Timestamp) -> Self {
        Self { now: Rc::new(Cell::new(start)) }
    }

    /// Jump to an absolute time
    pub fn set(&self, timestamp: Timestamp) {
        self.now.set(timestamp);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

impl Delay for MockTimeSource {
    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

/// Wall clock for tests, following a [`MockTimeSource`]
///
/// Local time is `base + mock.now()` once a base has been set, `None` before.
#[derive(Debug, Clone)]
pub struct MockWallClock {
    base: Rc<Cell<Option<NaiveDateTime>>>,
    ticks: MockTimeSource,
}

impl MockWallClock {
    /// Unsynchronized clock following `ticks`
    pub fn unsynced(ticks: MockTimeSource) -> Self {
        Self { base: Rc::new(Cell::new(None)), ticks }
    }

    /// Clock reading `base` at tick 0
    pub fn synced(base: NaiveDateTime, ticks: MockTimeSource) -> Self {
        Self { base: Rc::new(Cell::new(Some(base))), ticks }
    }

    /// Set or clear the base time (shared by clones)
    pub fn set_base(&self, base: Option<NaiveDateTime>) {
        self.base.set(base);
    }
}

impl WallClock for MockWallClock {
    fn local_time(&self) -> Option<NaiveDateTime> {
        let base = self.base.get()?;
        let elapsed = i64::try_from(self.ticks.now()).ok()?;
        base.checked_add_signed(chrono::Duration::milliseconds(elapsed))
    }
}

/// Render the current wall-clock time as record timestamp text
///
/// Falls back to `"Time Error!"` while the clock is unsynchronized.
pub fn timestamp_text(clock: &dyn WallClock) -> TimestampText {
    let mut text = TimestampText::new();
    match clock.local_time() {
        Some(time) => {
            if write!(text, "{}", time.format(TIMESTAMP_FORMAT)).is_err() {
                text.clear();
                let _ = text.push_str(TIME_ERROR_TIMESTAMP);
            }
        }
        None => {
            let _ = text.push_str(TIME_ERROR_TIMESTAMP);
        }
    }
    text
}

/// Tracks whether the wall clock has synchronized at least once
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeSync {
    synced: bool,
    attempts: u32,
}

impl TimeSync {
    /// Not yet synchronized
    pub const fn new() -> Self {
        Self { synced: false, attempts: 0 }
    }

    /// Check the clock once; a no-op after the first success
    pub fn check(&mut self, clock: &dyn WallClock) -> StationResult<()> {
        if self.synced {
            return Ok(());
        }
        self.attempts += 1;
        if clock.local_time().is_some() {
            log_info!("Time synchronized after {} attempt(s)", self.attempts);
            self.synced = true;
            Ok(())
        } else {
            log_warn!("Time not synchronized, retrying");
            Err(StationError::TimeSyncFailure)
        }
    }

    /// Whether the clock has synchronized
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Number of checks made before (and including) the first success
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn mock_time_advances() {
        let time = MockTimeSource::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);
    }

    #[test]
    fn mock_delay_advances_shared_clock() {
        let clock = MockTimeSource::new(0);
        let mut delay = clock.clone();

        delay.delay_ms(500);
        delay.delay_ms(500);
        assert_eq!(clock.now(), 1000);
    }

    #[test]
    fn timestamp_text_formats_wall_clock() {
        let ticks = MockTimeSource::new(0);
        let clock = MockWallClock::synced(base(), ticks.clone());
        assert_eq!(timestamp_text(&clock).as_str(), "2024-01-15 08:30:00");

        ticks.advance(61_000);
        assert_eq!(timestamp_text(&clock).as_str(), "2024-01-15 08:31:01");
    }

    #[test]
    fn timestamp_text_falls_back_when_unsynced() {
        let clock = MockWallClock::unsynced(MockTimeSource::new(0));
        assert_eq!(timestamp_text(&clock).as_str(), "Time Error!");
    }

    #[test]
    fn time_sync_retries_until_first_success() {
        let clock = MockWallClock::unsynced(MockTimeSource::new(0));
        let mut sync = TimeSync::new();

        assert_eq!(sync.check(&clock), Err(StationError::TimeSyncFailure));
        assert_eq!(sync.check(&clock), Err(StationError::TimeSyncFailure));
        assert!(!sync.is_synced());

        clock.set_base(Some(base()));
        assert_eq!(sync.check(&clock), Ok(()));
        assert!(sync.is_synced());
        assert_eq!(sync.attempts(), 3);

        // Losing the clock later does not un-sync
        clock.set_base(None);
        assert_eq!(sync.check(&clock), Ok(()));
        assert_eq!(sync.attempts(), 3);
    }

    #[cfg(feature = "std")]
    #[test]
    fn system_wall_clock_applies_offset() {
        let offsets = crate::config::ClockOffsets { gmt_offset_s: -21_600, daylight_offset_s: 3600 };
        let clock = SystemWallClock::from_offsets(&offsets);
        assert_eq!(clock.offset_seconds(), -18_000);
        if let Some(local) = clock.local_time() {
            let utc = chrono::Utc::now().naive_utc();
            let diff = (utc - local).num_seconds();
            assert!((17_990..=18_010).contains(&diff));
        }
    }
}
