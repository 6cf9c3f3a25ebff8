//! Threshold Alert Gate
//!
//! Sits between the sampling task and the [`Mailer`]. An alert fires on the
//! first reading above the threshold, then at most once per cool-down window
//! while the condition holds. The gate re-arms only after a reading at or
//! below the threshold.
//!
//! ```text
//!            temp > T, first crossing           temp > T, cool-down elapsed
//!  Armed ─────────────────────────────► Tripped ───────────────────────────┐
//!    ▲                                     │  ▲                            │
//!    └──────────── temp <= T ──────────────┘  └──────── alert again ───────┘
//! ```
//!
//! Delivery is fire-and-forget. A failed send still starts the cool-down, so a
//! broken transport is tried once per window, not once per sample.

use core::fmt::Write;

use crate::constants::alert::{ALERT_COOLDOWN_MS, ALERT_SUBJECT, FREEZER_THRESHOLD_F};
use crate::time::Timestamp;
use crate::traits::Mailer;

/// Alert threshold and cool-down
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AlertPolicy {
    /// Alert when the temperature (°F) is strictly above this
    pub threshold_f: f32,
    /// Minimum time between alerts while above the threshold
    pub cooldown_ms: u64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self { threshold_f: FREEZER_THRESHOLD_F, cooldown_ms: ALERT_COOLDOWN_MS }
    }
}

/// Outcome of one gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// At or below threshold (or no valid reading)
    Normal,
    /// Above threshold, alert sent
    Sent,
    /// Above threshold, send attempted and failed
    Failed,
    /// Above threshold, still in cool-down
    Suppressed,
}

/// Cool-down and re-arm state
#[derive(Debug, Clone, Default)]
pub struct AlertGate {
    policy: AlertPolicy,
    above: bool,
    last_alert_ms: Timestamp,
    alerts_sent: u32,
    failures: u32,
}

impl AlertGate {
    /// Armed gate
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    /// Active policy
    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Check a reading and send an alert if the gate allows it
    ///
    /// NaN readings neither fire nor re-arm.
    pub fn check_and_send(
        &mut self,
        temperature_f: f32,
        now: Timestamp,
        mailer: &mut dyn Mailer,
    ) -> AlertDecision {
        if temperature_f.is_nan() {
            return AlertDecision::Normal;
        }
        if temperature_f <= self.policy.threshold_f {
            if self.above {
                log_info!("Temperature back at {:.1}°F, alert re-armed", temperature_f);
            }
            self.above = false;
            return AlertDecision::Normal;
        }

        let cooled_down = now.saturating_sub(self.last_alert_ms) >= self.policy.cooldown_ms;
        if self.above && !cooled_down {
            return AlertDecision::Suppressed;
        }

        self.above = true;
        self.last_alert_ms = now;

        let body = alert_body(self.policy.threshold_f, temperature_f);
        match mailer.send_alert(ALERT_SUBJECT, &body) {
            Ok(()) => {
                self.alerts_sent = self.alerts_sent.saturating_add(1);
                log_info!("Alert sent: {}", body.as_str());
                AlertDecision::Sent
            }
            Err(err) => {
                self.failures = self.failures.saturating_add(1);
                log_error!("Alert not delivered: {}", err);
                AlertDecision::Failed
            }
        }
    }

    /// Whether the condition currently holds (gate tripped)
    pub fn is_tripped(&self) -> bool {
        self.above
    }

    /// Alerts delivered
    pub fn alerts_sent(&self) -> u32 {
        self.alerts_sent
    }

    /// Sends that failed
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Alert body text
pub fn alert_body(threshold_f: f32, temperature_f: f32) -> heapless::String<96> {
    let mut body = heapless::String::new();
    // Extreme values may be cut at the capacity
    let _ = write!(
        body,
        "Temperature has risen above {}°F, Currently {:.1}°F",
        threshold_f, temperature_f
    );
    body
}
