//! Alert Constants

/// Freezer alert threshold (°F).
///
/// Water freezes at 32 °F; a freezer reading above it means the contents are
/// thawing.
pub const FREEZER_THRESHOLD_F: f32 = 32.0;

/// Minimum time between two alerts while the condition holds (milliseconds).
pub const ALERT_COOLDOWN_MS: u64 = 3_600_000;

/// Alert subject line.
pub const ALERT_SUBJECT: &str = "Freezer Temperature Alert";
