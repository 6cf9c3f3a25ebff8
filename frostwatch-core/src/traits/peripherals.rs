//! External Collaborator Contracts
//!
//! The sensor driver, link layer, outbound mail transport and display are
//! outside the core. The core only calls these traits, on schedule, and
//! never assumes more than the contract says.
//!
//! Every method takes `&mut self`: the monitor is single-threaded and owns its
//! peripherals outright.

use crate::errors::StationResult;

/// Environmental sensor (temperature + relative humidity)
///
/// A failed read may return either an error or a non-finite value; the
/// sampling task treats both the same way and still logs the record.
pub trait Sensor {
    /// Temperature in degrees Celsius
    fn read_temperature_c(&mut self) -> StationResult<f32>;

    /// Relative humidity in percent
    fn read_humidity(&mut self) -> StationResult<f32>;
}

/// Detailed link status as reported by the network stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Associated and addressable
    Connected,
    /// Configured network not visible
    NoSsidAvailable,
    /// Association attempt rejected
    ConnectFailed,
    /// Was connected, dropped
    ConnectionLost,
    /// Not connected, no attempt in progress
    Disconnected,
    /// Anything the stack cannot classify
    Unknown,
}

impl LinkStatus {
    /// Human-readable description
    pub const fn describe(&self) -> &'static str {
        match self {
            LinkStatus::Connected => "Connected",
            LinkStatus::NoSsidAvailable => "SSID Not Available",
            LinkStatus::ConnectFailed => "Connection Failed",
            LinkStatus::ConnectionLost => "Connection Lost",
            LinkStatus::Disconnected => "Disconnected",
            LinkStatus::Unknown => "Unknown",
        }
    }

    /// Check if the link is usable
    pub const fn is_connected(&self) -> bool {
        matches!(self, LinkStatus::Connected)
    }
}

/// Network link (association and transport live behind this)
pub trait Link {
    /// Current link status
    fn status(&mut self) -> LinkStatus;

    /// Start (re)association; must return without waiting for completion
    fn begin(&mut self);

    /// Received signal strength in dBm
    fn signal_strength(&mut self) -> i32;
}

/// Outbound alert transport
///
/// Fire-and-forget: the core logs a failure and never retries within the
/// same invocation.
pub trait Mailer {
    /// Deliver one alert
    fn send_alert(&mut self, subject: &str, body: &str) -> StationResult<()>;
}

/// One sample as shown to a display
#[derive(Debug, Clone, Copy)]
pub struct ReadingView<'a> {
    /// Timestamp text
    pub timestamp: &'a str,
    /// Temperature (°F)
    pub temperature_f: f32,
    /// Relative humidity (%)
    pub humidity: f32,
    /// Hours since the link first came up
    pub uptime_hours: f32,
}

/// Local status display
pub trait Display {
    /// Show the latest sample
    fn show_reading(&mut self, reading: &ReadingView<'_>);

    /// Show a one-line status message
    fn show_status(&mut self, message: &str);
}

/// Display that shows nothing, for headless deployments
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn show_reading(&mut self, _reading: &ReadingView<'_>) {}

    fn show_status(&mut self, _message: &str) {}
}
