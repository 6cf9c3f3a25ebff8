//! TCP Probe Link
//!
//! A host has no radio to associate, but the station still wants to know
//! whether the network is reachable. `TcpProbeLink` answers `status()` by
//! attempting a TCP connect to a known endpoint (gateway, DNS server, the
//! webhook host) with a short timeout.
//!
//! Probe results are cached for `probe_interval` so the reconnect poll loop
//! does not open a socket on every call.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use frostwatch_core::traits::{Link, LinkStatus};

use crate::ConnectorError;

/// Default probe connect timeout (milliseconds)
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 500;

/// Probe configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Endpoint to probe, `host:port`
    pub target: String,
    /// Connect timeout per probe
    pub timeout: Duration,
    /// Minimum time between two probes
    pub probe_interval: Duration,
    /// Value reported by `signal_strength` (no radio on a host)
    pub nominal_rssi_dbm: i32,
}

impl ProbeConfig {
    /// Probe `target`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            probe_interval: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            nominal_rssi_dbm: 0,
        }
    }

    /// Set connect timeout in milliseconds
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms.max(1));
        self
    }

    /// Set probe cache lifetime in milliseconds
    pub fn probe_interval_ms(mut self, ms: u64) -> Self {
        self.probe_interval = Duration::from_millis(ms);
        self
    }
}

/// Link whose status is a cached TCP connect probe
pub struct TcpProbeLink {
    config: ProbeConfig,
    addr: SocketAddr,
    status: LinkStatus,
    ever_connected: bool,
    last_probe: Option<Instant>,
    probes: u64,
}

impl TcpProbeLink {
    /// Resolve the target; no probe is made yet
    pub fn new(config: ProbeConfig) -> Result<Self, ConnectorError> {
        let addr = config
            .target
            .to_socket_addrs()
            .map_err(|e| ConnectorError::Resolve(format!("{}: {}", config.target, e)))?
            .next()
            .ok_or_else(|| ConnectorError::Resolve(format!("{}: no addresses", config.target)))?;
        Ok(Self {
            config,
            addr,
            status: LinkStatus::Disconnected,
            ever_connected: false,
            last_probe: None,
            probes: 0,
        })
    }

    /// Resolved probe address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Probes made so far
    pub fn probes(&self) -> u64 {
        self.probes
    }

    fn probe(&mut self) -> LinkStatus {
        self.probes += 1;
        self.last_probe = Some(Instant::now());
        match TcpStream::connect_timeout(&self.addr, self.config.timeout) {
            Ok(_) => LinkStatus::Connected,
            // Refused still means the host answered
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => LinkStatus::Connected,
            Err(e) if e.kind() == ErrorKind::TimedOut && self.ever_connected => LinkStatus::ConnectionLost,
            Err(e) if e.kind() == ErrorKind::AddrNotAvailable => LinkStatus::NoSsidAvailable,
            Err(e) => {
                log::debug!("Probe of {} failed: {}", self.addr, e);
                if self.ever_connected {
                    LinkStatus::ConnectionLost
                } else {
                    LinkStatus::ConnectFailed
                }
            }
        }
    }

    fn probe_due(&self) -> bool {
        self.last_probe
            .map_or(true, |at| at.elapsed() >= self.config.probe_interval)
    }
}

impl Link for TcpProbeLink {
    fn status(&mut self) -> LinkStatus {
        if self.probe_due() {
            self.status = self.probe();
            if self.status.is_connected() {
                self.ever_connected = true;
            }
        }
        self.status
    }

    fn begin(&mut self) {
        // Next status() probes immediately
        self.last_probe = None;
        self.status = LinkStatus::Disconnected;
    }

    fn signal_strength(&mut self) -> i32 {
        self.config.nominal_rssi_dbm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn reachable_listener_is_connected() {
        let server = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut link = TcpProbeLink::new(ProbeConfig::new(server.local_addr().unwrap().to_string())).unwrap();

        assert_eq!(link.status(), LinkStatus::Connected);
        assert_eq!(link.signal_strength(), 0);
    }

    #[test]
    fn status_is_cached_between_probes() {
        let server = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ProbeConfig::new(server.local_addr().unwrap().to_string()).probe_interval_ms(60_000);
        let mut link = TcpProbeLink::new(config).unwrap();

        link.status();
        link.status();
        assert_eq!(link.probes(), 1);

        link.begin();
        link.status();
        assert_eq!(link.probes(), 2);
    }

    #[test]
    fn unresolvable_target_is_rejected() {
        assert!(matches!(
            TcpProbeLink::new(ProbeConfig::new("no port here")),
            Err(ConnectorError::Resolve(_))
        ));
    }
}
