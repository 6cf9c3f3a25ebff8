//! TCP Dashboard Listener
//!
//! ## Overview
//!
//! Implements the core's `RequestListener` on a `std::net::TcpListener`. The
//! listener socket is non-blocking, so `poll_request` returns
//! `nb::Error::WouldBlock` immediately when no browser is waiting and the
//! scheduler pass moves on.
//!
//! Accepted streams are switched back to blocking mode with read and write
//! timeouts. A read that times out is reported to the core as end of data,
//! the same way a microcontroller's `readStringUntil` gives up.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use frostwatch_connectors::http::{HttpConfig, TcpRequestListener};
//!
//! let config = HttpConfig::new("127.0.0.1:8080")
//!     .read_timeout_ms(500)
//!     .write_timeout_ms(2000);
//!
//! let listener = TcpRequestListener::bind(config)?;
//! println!("Dashboard on http://{}", listener.local_addr()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use frostwatch_core::constants::time::REQUEST_READ_TIMEOUT_MS;
use frostwatch_core::service::{Connection, RequestListener, ServiceError};
use thiserror::Error;

use crate::ConnectionStats;

/// Default bind address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:80";

/// Default write timeout (milliseconds)
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5000;

/// Most request bytes discarded after the response is sent
const MAX_DRAIN_BYTES: usize = 16 * 1024;

/// Listener errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Could not bind the listening socket
    #[error("Bind to {addr} failed: {source}")]
    Bind {
        /// Requested address
        addr: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Socket option could not be applied
    #[error("Socket setup failed: {0}")]
    Socket(#[from] std::io::Error),
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind, `host:port`
    pub bind_addr: String,
    /// Read timeout on accepted streams
    pub read_timeout: Duration,
    /// Write timeout on accepted streams
    pub write_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BIND_ADDR)
    }
}

impl HttpConfig {
    /// Create configuration for `bind_addr`
    pub fn new(bind_addr: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            read_timeout: Duration::from_millis(REQUEST_READ_TIMEOUT_MS),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
        }
    }

    /// Set read timeout in milliseconds
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.read_timeout = Duration::from_millis(ms.max(1));
        self
    }

    /// Set write timeout in milliseconds
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.write_timeout = Duration::from_millis(ms.max(1));
        self
    }
}

/// Non-blocking TCP listener serving one peer per poll
pub struct TcpRequestListener {
    config: HttpConfig,
    listener: TcpListener,
    stats: ConnectionStats,
}

impl TcpRequestListener {
    /// Bind and switch the socket to non-blocking mode
    pub fn bind(config: HttpConfig) -> Result<Self, HttpError> {
        let listener = TcpListener::bind(&config.bind_addr).map_err(|source| HttpError::Bind {
            addr: config.bind_addr.clone(),
            source,
        })?;
        listener.set_nonblocking(true)?;
        log::info!("Dashboard listener bound to {}", config.bind_addr);
        Ok(Self { config, listener, stats: ConnectionStats::default() })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Active configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Listener statistics
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    fn prepare(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(self.config.read_timeout))?;
        stream.set_write_timeout(Some(self.config.write_timeout))?;
        stream.set_nodelay(true)
    }
}

impl RequestListener for TcpRequestListener {
    fn poll_request(&mut self) -> nb::Result<Box<dyn Connection>, ServiceError> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = self.prepare(&stream) {
                    self.stats.record_failure(&e);
                    log::warn!("Dropping peer {}: {}", peer, e);
                    return Err(nb::Error::Other(ServiceError::Io { operation: "configure stream" }));
                }
                self.stats.connections_accepted += 1;
                log::debug!("Accepted peer {}", peer);
                Ok(Box::new(TcpConnection::new(stream)))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(nb::Error::WouldBlock),
            Err(e) => {
                self.stats.record_failure(&e);
                Err(nb::Error::Other(ServiceError::Io { operation: "accept" }))
            }
        }
    }
}

/// Accepted peer stream
pub struct TcpConnection {
    stream: TcpStream,
}

impl TcpConnection {
    /// Wrap a connected stream
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Discard pending input until end of stream, timeout or the drain cap
    fn drain(&mut self) {
        let mut scratch = [0u8; 512];
        let mut drained = 0;
        while drained < MAX_DRAIN_BYTES {
            match self.stream.read(&mut scratch) {
                Ok(0) | Err(_) => break,
                Ok(n) => drained += n,
            }
        }
    }
}

impl Connection for TcpConnection {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ServiceError> {
        match self.stream.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(0),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(0),
            Err(e) if is_disconnect(e.kind()) => Err(ServiceError::Closed),
            Err(_) => Err(ServiceError::Io { operation: "read" }),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), ServiceError> {
        self.stream.write_all(data).map_err(|e| {
            if is_disconnect(e.kind()) {
                ServiceError::Closed
            } else {
                ServiceError::Io { operation: "write" }
            }
        })
    }

    fn close(&mut self) -> Result<(), ServiceError> {
        self.stream.flush().map_err(|_| ServiceError::Io { operation: "flush" })?;
        match self.stream.shutdown(Shutdown::Write) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotConnected => return Ok(()),
            Err(_) => return Err(ServiceError::Io { operation: "shutdown" }),
        }
        // Unread request headers would turn the close into a reset
        self.drain();
        Ok(())
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
    )
}
