//! Log records and their line format
//!
//! One record per line, fields in fixed order and fixed precision:
//!
//! ```text
//! <timestamp>,<temperature:1dp>,<humidity:1dp>,<uptime_hours:2dp>,<signal_strength>
//! 2024-01-15 08:30:00,-4.2,61.0,12.34,-67
//! ```
//!
//! There is no header, no schema version and no escaping. A comma inside a
//! timestamp would shift every later field, so it is replaced with `;` when
//! the record is created. Non-finite floats are written as `nan` so a failed
//! sensor read never breaks a batch.

use core::fmt::{self, Write};

use crate::constants::buffers::{MAX_LINE_LEN, TIMESTAMP_CAPACITY};
use crate::constants::storage::NAN_FIELD;
use crate::constants::time::MS_PER_HOUR;
use crate::time::Timestamp;

/// Inline timestamp text, no heap
pub type TimestampText = heapless::String<TIMESTAMP_CAPACITY>;

/// One formatted line, no heap
pub type LineBuf = heapless::String<MAX_LINE_LEN>;

/// One sample as persisted in the log
///
/// Immutable once created. Append order is time order; a timestamp that goes
/// backwards is kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Wall-clock time text (or the "Time Error!" sentinel)
    pub timestamp: TimestampText,
    /// Temperature (°F)
    pub temperature: f32,
    /// Relative humidity (%)
    pub humidity: f32,
    /// Hours since the link first came up
    pub uptime_hours: f32,
    /// Link signal strength (dBm)
    pub signal_strength: i32,
}

impl LogRecord {
    /// Create record, sanitizing the timestamp
    ///
    /// Commas and line breaks are replaced with `;` and text past the inline
    /// capacity is dropped.
    pub fn new(
        timestamp: &str,
        temperature: f32,
        humidity: f32,
        uptime_hours: f32,
        signal_strength: i32,
    ) -> Self {
        let mut text = TimestampText::new();
        for c in timestamp.trim().chars() {
            let c = match c {
                ',' | '\n' | '\r' => ';',
                other => other,
            };
            if text.push(c).is_err() {
                break;
            }
        }
        Self { timestamp: text, temperature, humidity, uptime_hours, signal_strength }
    }

    /// Write the record as one line, without the trailing newline
    pub fn write_line<W: Write>(&self, out: &mut W) -> fmt::Result {
        out.write_str(&self.timestamp)?;
        out.write_char(',')?;
        write_fixed(out, self.temperature, 1)?;
        out.write_char(',')?;
        write_fixed(out, self.humidity, 1)?;
        out.write_char(',')?;
        write_fixed(out, self.uptime_hours, 2)?;
        write!(out, ",{}", self.signal_strength)
    }

    /// Format into an inline line buffer
    pub fn to_line(&self) -> LineBuf {
        let mut line = LineBuf::new();
        // Timestamp is capped well below the line capacity
        let _ = self.write_line(&mut line);
        line
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_line(f)
    }
}

/// Fixed-precision float, `nan` for anything non-finite
fn write_fixed<W: Write>(out: &mut W, value: f32, decimals: usize) -> fmt::Result {
    if value.is_finite() {
        write!(out, "{:.*}", decimals, value)
    } else {
        out.write_str(NAN_FIELD)
    }
}

/// Convert Celsius to Fahrenheit
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Hours elapsed since the link first came up, 0 if it never did
pub fn uptime_hours(now: Timestamp, connected_since: Option<Timestamp>) -> f32 {
    match connected_since {
        Some(since) => now.saturating_sub(since) as f32 / MS_PER_HOUR as f32,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format_fixed_precision() {
        let record = LogRecord::new("2024-01-15 08:30:00", 98.6, 45.2, 1.5, -67);
        assert_eq!(record.to_line().as_str(), "2024-01-15 08:30:00,98.6,45.2,1.50,-67");
    }

    #[test]
    fn negative_and_rounded_values() {
        let record = LogRecord::new("t", -4.24, 100.0, 12.345, 0);
        let line = record.to_line();
        assert!(line.starts_with("t,-4.2,100.0,12.3"), "line was {}", line);
        assert!(line.ends_with(",0"));
    }

    #[test]
    fn non_finite_fields_use_sentinel() {
        let record = LogRecord::new("t", f32::NAN, f32::INFINITY, 0.0, -70);
        assert_eq!(record.to_line().as_str(), "t,nan,nan,0.00,-70");
    }

    #[test]
    fn timestamp_commas_are_replaced() {
        let record = LogRecord::new("Mon, 15 Jan", 0.0, 0.0, 0.0, 0);
        assert_eq!(record.timestamp.as_str(), "Mon; 15 Jan");
        assert_eq!(record.to_line().split(',').count(), 5);
    }

    #[test]
    fn long_timestamp_is_truncated() {
        let long = "x".repeat(100);
        let record = LogRecord::new(&long, 0.0, 0.0, 0.0, 0);
        assert_eq!(record.timestamp.len(), TIMESTAMP_CAPACITY);
    }

    #[test]
    fn fahrenheit_conversion() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
    }

    #[test]
    fn uptime_zero_until_connected() {
        assert_eq!(uptime_hours(7_200_000, None), 0.0);
        assert_eq!(uptime_hours(7_200_000, Some(0)), 2.0);
        assert_eq!(uptime_hours(1000, Some(5000)), 0.0);
    }
}
