//! Webhook Alert Mailer
//!
//! ## Overview
//!
//! Delivers freezer alerts by POSTing a small JSON document to a webhook
//! (a mail relay, a chat integration, an automation service). Stands in for
//! the SMTP client a microcontroller build would use.
//!
//! ```json
//! {
//!   "station": "frostwatch",
//!   "subject": "Freezer Temperature Alert",
//!   "body": "Temperature has risen above 32°F, Currently 35.2°F"
//! }
//! ```
//!
//! ## Delivery Semantics
//!
//! One attempt per alert, bounded by the agent timeout. The core logs a
//! failure and relies on its own cool-down; nothing is retried here.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use frostwatch_connectors::webhook::{WebhookConfig, WebhookMailer};
//! use frostwatch_core::traits::Mailer;
//!
//! let config = WebhookConfig::new("https://hooks.example.com/frostwatch")
//!     .bearer_token("your-api-token")
//!     .timeout_secs(5)
//!     .station_name("garage-freezer");
//!
//! let mut mailer = WebhookMailer::new(config)?;
//! mailer.send_alert("Freezer Temperature Alert", "Temperature has risen above 32°F, Currently 35.2°F")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use frostwatch_core::errors::{StationError, StationResult};
use frostwatch_core::traits::Mailer;
use serde::Serialize;
use thiserror::Error;

use crate::ConnectionStats;

/// Webhook delivery errors
#[derive(Debug, Error)]
pub enum MailError {
    /// Network or transport error
    #[error("Request failed: {0}")]
    Transport(String),

    /// Endpoint returned an error status
    #[error("Server error {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MailError {
    /// Short static reason for the core's error type
    pub fn reason(&self) -> &'static str {
        match self {
            MailError::Transport(_) => "webhook unreachable",
            MailError::Status { status, .. } if *status >= 500 => "webhook server error",
            MailError::Status { .. } => "webhook rejected alert",
            MailError::Serialization(_) => "alert not serializable",
            MailError::Config(_) => "webhook misconfigured",
        }
    }
}

/// Authentication methods
#[derive(Clone, Debug)]
pub enum AuthMethod {
    /// No authentication
    None,
    /// Bearer token
    Bearer(String),
    /// Basic authentication
    Basic {
        /// User name
        username: String,
        /// Password
        password: String,
    },
    /// API key in header
    ApiKey {
        /// Header name
        header: String,
        /// Header value
        value: String,
    },
}

/// Webhook configuration
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// Endpoint URL
    pub url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Authentication method
    pub auth: AuthMethod,
    /// Custom headers
    pub headers: HashMap<String, String>,
    /// Station name included in every payload
    pub station_name: String,
    /// User agent string
    pub user_agent: String,
}

impl WebhookConfig {
    /// Create configuration for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
            auth: AuthMethod::None,
            headers: HashMap::new(),
            station_name: String::from("frostwatch"),
            user_agent: format!("Frostwatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set bearer token authentication
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    /// Set basic authentication
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Basic { username: username.into(), password: password.into() };
        self
    }

    /// Set API key authentication
    pub fn api_key(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth = AuthMethod::ApiKey { header: header.into(), value: value.into() };
        self
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Set station name
    pub fn station_name(mut self, name: impl Into<String>) -> Self {
        self.station_name = name.into();
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[derive(Serialize)]
struct AlertPayload<'a> {
    station: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Mailer posting alerts to a webhook
pub struct WebhookMailer {
    config: WebhookConfig,
    agent: ureq::Agent,
    stats: ConnectionStats,
}

impl WebhookMailer {
    /// Create mailer, validating the URL
    pub fn new(config: WebhookConfig) -> Result<Self, MailError> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(MailError::Config("URL must start with http:// or https://".into()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self { config, agent, stats: ConnectionStats::default() })
    }

    /// JSON document for one alert
    pub fn payload(&self, subject: &str, body: &str) -> Result<String, MailError> {
        serde_json::to_string(&AlertPayload { station: &self.config.station_name, subject, body })
            .map_err(|e| MailError::Serialization(e.to_string()))
    }

    /// Post one alert
    pub fn send(&mut self, subject: &str, body: &str) -> Result<(), MailError> {
        let json = self.payload(subject, body)?;
        let request = self.build_request(self.agent.post(&self.config.url));

        match request.send_string(&json) {
            Ok(_) => {
                self.stats.record_success(json.len());
                log::info!("Alert delivered to webhook");
                Ok(())
            }
            Err(ureq::Error::Status(code, resp)) => {
                let err = MailError::Status {
                    status: code,
                    message: resp.into_string().unwrap_or_default(),
                };
                self.stats.record_failure(&err);
                Err(err)
            }
            Err(ureq::Error::Transport(e)) => {
                let err = MailError::Transport(e.to_string());
                self.stats.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Delivery statistics
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Build request with authentication and headers
    fn build_request(&self, mut request: ureq::Request) -> ureq::Request {
        match &self.config.auth {
            AuthMethod::None => {}
            AuthMethod::Bearer(token) => {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }
            AuthMethod::Basic { username, password } => {
                request = request.set("Authorization", &basic_credentials(username, password));
            }
            AuthMethod::ApiKey { header, value } => {
                request = request.set(header, value);
            }
        }

        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }

        request.set("Content-Type", "application/json")
    }
}

impl Mailer for WebhookMailer {
    fn send_alert(&mut self, subject: &str, body: &str) -> StationResult<()> {
        self.send(subject, body).map_err(|e| {
            log::warn!("Webhook delivery failed: {}", e);
            StationError::AlertDeliveryFailed { reason: e.reason() }
        })
    }
}

fn basic_credentials(username: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}
