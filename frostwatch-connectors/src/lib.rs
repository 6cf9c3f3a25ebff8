//! Host-side Collaborators for the Frostwatch Monitor
//!
//! ## Overview
//!
//! `frostwatch-core` reaches the outside world only through traits. This
//! crate implements those traits on a regular host (Linux board, desktop,
//! CI runner) using `std::net` and a small blocking HTTP client.
//!
//! | Core trait         | Implementation                | Transport                 |
//! |--------------------|-------------------------------|---------------------------|
//! | `RequestListener`  | [`http::TcpRequestListener`]  | non-blocking `TcpListener`|
//! | `Mailer`           | [`webhook::WebhookMailer`]    | JSON POST via `ureq`      |
//! | `Link`             | [`link::TcpProbeLink`]        | TCP connect probe         |
//!
//! ## Blocking Budget
//!
//! The station is single-threaded, so every call here must return within a
//! bounded time:
//! - `poll_request` never blocks; accepted streams get read/write timeouts
//! - webhook posts use the agent timeout
//! - link probes use a connect timeout
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use frostwatch_connectors::http::{HttpConfig, TcpRequestListener};
//! use frostwatch_connectors::link::{ProbeConfig, TcpProbeLink};
//!
//! let listener = TcpRequestListener::bind(HttpConfig::new("0.0.0.0:8080"))?;
//! let link = TcpProbeLink::new(ProbeConfig::new("192.168.1.1:53"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(feature = "std")]
pub mod http;

#[cfg(feature = "std")]
pub mod link;

#[cfg(feature = "webhook")]
pub mod webhook;

// Re-export common types
#[cfg(feature = "std")]
pub use http::{HttpConfig, HttpError, TcpRequestListener};
#[cfg(feature = "std")]
pub use link::{ProbeConfig, TcpProbeLink};
#[cfg(feature = "webhook")]
pub use webhook::{MailError, WebhookConfig, WebhookMailer};

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Address did not resolve
    #[error("Address resolution failed: {0}")]
    Resolve(String),
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Exchanges completed successfully
    pub messages_sent: u64,
    /// Exchanges that failed
    pub messages_failed: u64,
    /// Payload bytes sent
    pub bytes_sent: u64,
    /// Inbound connections accepted
    pub connections_accepted: u64,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    pub(crate) fn record_success(&mut self, bytes: usize) {
        self.messages_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    pub(crate) fn record_failure(&mut self, error: impl ToString) {
        self.messages_failed += 1;
        self.last_error = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_track_outcomes() {
        let mut stats = ConnectionStats::default();
        stats.record_success(120);
        stats.record_failure("timed out");
        assert_eq!(stats.messages_sent, 1);
        assert_eq!(stats.bytes_sent, 120);
        assert_eq!(stats.messages_failed, 1);
        assert_eq!(stats.last_error.as_deref(), Some("timed out"));
    }
}
