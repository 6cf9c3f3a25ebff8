//! Connectivity Supervisor
//!
//! Keeps the network link up without ever blocking for longer than one
//! reconnect window. The link itself (association, DHCP, radio) is behind the
//! [`Link`] trait; the supervisor only decides when to ask for a reconnect and
//! how long to wait for it.
//!
//! ## Reconnect Procedure
//!
//! ```text
//! delay(settle_ms)                 let the stack drop the old association
//! link.begin()
//! while !connected && waited < timeout_ms:
//!     delay(poll_interval_ms)
//! ```
//!
//! Giving up is not an error the station halts on: the state goes back to
//! `Disconnected` and the maintenance task tries again on its next interval.

use alloc::boxed::Box;

use crate::constants::time::{RECONNECT_POLL_INTERVAL_MS, RECONNECT_SETTLE_MS, RECONNECT_TIMEOUT_MS};
use crate::errors::{StationError, StationResult};
use crate::record::uptime_hours;
use crate::time::{Delay, TimeSource, Timestamp};
use crate::traits::{Link, LinkStatus};

/// Coarse link state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    /// Link down, no attempt in progress
    Disconnected,
    /// Reconnect in progress
    Connecting,
    /// Link up
    Connected,
}

/// Reconnect timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReconnectPolicy {
    /// Longest time to wait for the link after `begin`
    pub timeout_ms: u64,
    /// Delay between status polls
    pub poll_interval_ms: u32,
    /// Delay before `begin`
    pub settle_ms: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: RECONNECT_TIMEOUT_MS,
            poll_interval_ms: RECONNECT_POLL_INTERVAL_MS,
            settle_ms: RECONNECT_SETTLE_MS,
        }
    }
}

/// Link statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityStats {
    /// Reconnect attempts started
    pub attempts: u32,
    /// Attempts that ended connected
    pub successes: u32,
    /// Checks that found the link down
    pub drops: u32,
}

/// Tracks and restores the link
pub struct ConnectivitySupervisor {
    link: Box<dyn Link>,
    policy: ReconnectPolicy,
    state: ConnectivityState,
    connected_since: Option<Timestamp>,
    stats: ConnectivityStats,
}

impl ConnectivitySupervisor {
    /// Supervise `link`
    pub fn new(link: Box<dyn Link>, policy: ReconnectPolicy) -> Self {
        Self {
            link,
            policy,
            state: ConnectivityState::Disconnected,
            connected_since: None,
            stats: ConnectivityStats::default(),
        }
    }

    /// Ask the link whether it is up
    pub fn is_connected(&mut self) -> bool {
        self.link.status().is_connected()
    }

    /// Bring the link up at start-up
    ///
    /// Same as [`Self::reconnect`] but logs progress for the boot sequence.
    pub fn connect(&mut self, clock: &dyn TimeSource, delay: &mut dyn Delay) -> bool {
        log_info!("Connecting to network...");
        let connected = self.reconnect(clock, delay);
        if !connected {
            log_warn!("Network not available at start-up, will retry");
        }
        connected
    }

    /// Reconnect using the policy timeout
    pub fn reconnect(&mut self, clock: &dyn TimeSource, delay: &mut dyn Delay) -> bool {
        self.reconnect_within(self.policy.timeout_ms, clock, delay)
    }

    /// Start association and poll until connected or `timeout_ms` elapses
    pub fn reconnect_within(
        &mut self,
        timeout_ms: u64,
        clock: &dyn TimeSource,
        delay: &mut dyn Delay,
    ) -> bool {
        self.state = ConnectivityState::Connecting;
        self.stats.attempts = self.stats.attempts.saturating_add(1);

        delay.delay_ms(self.policy.settle_ms);
        self.link.begin();

        let started = clock.now();
        loop {
            if self.is_connected() {
                let now = clock.now();
                self.mark_connected(now);
                self.stats.successes = self.stats.successes.saturating_add(1);
                log_info!("Network connected after {} ms", now.saturating_sub(started));
                return true;
            }
            if clock.now().saturating_sub(started) >= timeout_ms {
                self.state = ConnectivityState::Disconnected;
                log_warn!("Network reconnect gave up after {} ms", timeout_ms);
                return false;
            }
            delay.delay_ms(self.policy.poll_interval_ms.max(1));
        }
    }

    /// Maintenance check: reconnect if the link dropped
    pub fn check(&mut self, clock: &dyn TimeSource, delay: &mut dyn Delay) -> StationResult<()> {
        if self.is_connected() {
            if self.state != ConnectivityState::Connected {
                self.mark_connected(clock.now());
            }
            log_debug!("Network connection stable");
            return Ok(());
        }

        self.stats.drops = self.stats.drops.saturating_add(1);
        log_warn!("Network connection lost, reconnecting");
        let started = clock.now();
        if self.reconnect(clock, delay) {
            Ok(())
        } else {
            Err(StationError::ConnectivityLost { waited_ms: clock.now().saturating_sub(started) })
        }
    }

    /// Log and return the detailed link status
    pub fn report(&mut self) -> LinkStatus {
        let status = self.link.status();
        if status.is_connected() {
            log_info!("Network status: {} ({} dBm)", status.describe(), self.link.signal_strength());
        } else {
            log_warn!("Network status: {}", status.describe());
        }
        status
    }

    /// Received signal strength in dBm
    pub fn signal_strength(&mut self) -> i32 {
        self.link.signal_strength()
    }

    /// Hours since the first successful connection, 0 before it
    pub fn uptime_hours(&self, now: Timestamp) -> f32 {
        uptime_hours(now, self.connected_since)
    }

    /// Time of the first successful connection
    pub fn connected_since(&self) -> Option<Timestamp> {
        self.connected_since
    }

    /// Coarse state as of the last check
    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Active policy
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Statistics
    pub fn stats(&self) -> &ConnectivityStats {
        &self.stats
    }

    fn mark_connected(&mut self, now: Timestamp) {
        self.state = ConnectivityState::Connected;
        if self.connected_since.is_none() {
            self.connected_since = Some(now);
        }
    }
}
