//! Inbound Request Service
//!
//! Serves the dashboard to at most one waiting peer per scheduler pass:
//!
//! 1. Non-blocking accept (`nb::Error::WouldBlock` when nobody is waiting)
//! 2. Read and discard the request line, bounded in bytes and by the
//!    connection's read timeout
//! 3. Build the history series and render the page
//! 4. Write a fixed `200 OK` response, then close
//!
//! No routing, no content negotiation, no keep-alive.

use alloc::boxed::Box;

use thiserror_no_std::Error;

use crate::constants::buffers::MAX_REQUEST_LINE;
use crate::dashboard;
use crate::history::HistoricalReader;
use crate::store::LogStore;
use crate::time::{timestamp_text, WallClock};

/// Fixed response head
pub const RESPONSE_HEAD: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n";

/// Errors talking to an inbound peer
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    /// Transport I/O failed
    #[error("I/O failed: {operation}")]
    Io {
        /// Which operation failed
        operation: &'static str,
    },

    /// Peer went away mid-exchange
    #[error("Connection closed by peer")]
    Closed,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ServiceError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Io { operation } => defmt::write!(fmt, "I/O failed: {}", operation),
            Self::Closed => defmt::write!(fmt, "Connection closed"),
        }
    }
}

/// One accepted peer connection
pub trait Connection {
    /// Read into `buf`; `Ok(0)` means no more data (end of stream or timeout)
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ServiceError>;

    /// Write all of `data`
    fn write_all(&mut self, data: &[u8]) -> Result<(), ServiceError>;

    /// Flush and close
    fn close(&mut self) -> Result<(), ServiceError>;
}

/// Source of inbound connections
pub trait RequestListener {
    /// Accept one waiting peer without blocking
    fn poll_request(&mut self) -> nb::Result<Box<dyn Connection>, ServiceError>;
}

/// Summary of one served request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServedRequest {
    /// Request-line bytes consumed
    pub request_bytes: usize,
    /// Response bytes written, head included
    pub response_bytes: usize,
    /// Lines in the embedded series
    pub series_lines: usize,
}

/// Read and discard the request line
///
/// Stops at `\r`, `\n`, end of data, or [`MAX_REQUEST_LINE`] bytes. Returns
/// the number of bytes consumed.
pub fn read_request_line(conn: &mut dyn Connection) -> Result<usize, ServiceError> {
    let mut byte = [0u8; 1];
    let mut consumed = 0;
    while consumed < MAX_REQUEST_LINE {
        if conn.read(&mut byte)? == 0 {
            break;
        }
        consumed += 1;
        if byte[0] == b'\r' || byte[0] == b'\n' {
            break;
        }
    }
    Ok(consumed)
}

/// Serve the dashboard on an accepted connection
///
/// The connection is closed on every path; a write error is returned after
/// the close attempt.
pub fn handle_request<S: LogStore>(
    conn: &mut dyn Connection,
    store: &S,
    reader: &HistoricalReader,
    clock: &dyn WallClock,
) -> Result<ServedRequest, ServiceError> {
    let request_bytes = match read_request_line(conn) {
        Ok(n) => n,
        Err(err) => {
            let _ = conn.close();
            return Err(err);
        }
    };

    let series = reader.read_series(store);
    let page = dashboard::render(&series, &timestamp_text(clock));

    let written = conn
        .write_all(RESPONSE_HEAD.as_bytes())
        .and_then(|_| conn.write_all(page.as_bytes()))
        .and_then(|_| conn.write_all(b"\r\n"));
    let closed = conn.close();
    written?;
    closed?;

    Ok(ServedRequest {
        request_bytes,
        response_bytes: RESPONSE_HEAD.len() + page.len() + 2,
        series_lines: series.len(),
    })
}

/// Accept and serve at most one waiting peer
///
/// `Ok(None)` when nobody was waiting.
pub fn serve_one<S: LogStore>(
    listener: &mut dyn RequestListener,
    store: &S,
    reader: &HistoricalReader,
    clock: &dyn WallClock,
) -> Result<Option<ServedRequest>, ServiceError> {
    let mut conn = match listener.poll_request() {
        Ok(conn) => conn,
        Err(nb::Error::WouldBlock) => return Ok(None),
        Err(nb::Error::Other(err)) => return Err(err),
    };
    log_debug!("Peer connected");
    let served = handle_request(conn.as_mut(), store, reader, clock)?;
    log_info!(
        "Served dashboard: {} bytes, {} points",
        served.response_bytes,
        served.series_lines
    );
    Ok(Some(served))
}
