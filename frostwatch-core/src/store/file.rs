//! File-backed log store
//!
//! Appends go through a short-lived `BufWriter` opened in append mode, so a
//! batch costs one open, one write burst and one close. Reads use their own
//! `File` handle with a fixed chunk buffer; memory stays bounded no matter
//! how large the log grows.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{LogAppender, LogReader, LogStore, RawLine, StoreError};
use crate::config::StationConfig;
use crate::constants::buffers::READ_CHUNK_SIZE;
use crate::record::LineBuf;

/// Statistics for one read handle
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadStats {
    /// Bytes pulled from the file
    pub bytes_read: usize,
    /// Lines returned
    pub lines_read: usize,
    /// Lines cut at the line buffer capacity
    pub lines_truncated: usize,
}

/// Log store in a single append-only file
///
/// ## Example
///
/// ```rust,no_run
/// use frostwatch_core::store::{FileLogStore, LogStore, LogAppender};
///
/// let mut store = FileLogStore::new("/var/lib/frostwatch/data_log.txt");
/// store.mount()?;
///
/// let mut appender = store.open_append()?;
/// appender.append_line("2024-01-15 08:30:00,-4.2,61.0,12.34,-67")?;
/// appender.close()?;
/// # Ok::<(), frostwatch_core::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileLogStore {
    path: PathBuf,
    mounted: bool,
}

impl FileLogStore {
    /// Create store for `path`; nothing is touched until [`LogStore::mount`]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), mounted: false }
    }

    /// Create store for the configured log path
    pub fn from_config(config: &StationConfig) -> Self {
        Self::new(config.log_path.as_str())
    }

    /// Log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file size, 0 if it does not exist yet
    pub fn size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

impl LogStore for FileLogStore {
    type Appender<'a> = FileAppender;
    type Reader<'a> = FileReader;

    fn mount(&mut self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                log_error!("Log directory {} does not exist", parent.display());
                return Err(StoreError::NotMounted);
            }
        }
        // Creating the file proves the medium is writable
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                log_error!("Mounting log store {} failed: {}", self.path.display(), e);
                StoreError::NotMounted
            })?;
        self.mounted = true;
        log_info!("Log store mounted at {}", self.path.display());
        Ok(())
    }

    fn open_append(&mut self) -> Result<Self::Appender<'_>, StoreError> {
        if !self.mounted {
            return Err(StoreError::NotMounted);
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|_| StoreError::Unavailable { operation: "open for append" })?;
        Ok(FileAppender { writer: BufWriter::new(file) })
    }

    fn open_read(&self) -> Result<Self::Reader<'_>, StoreError> {
        let file = File::open(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::Unavailable { operation: "open for read: no log file" },
            _ => StoreError::Unavailable { operation: "open for read" },
        })?;
        let size = file
            .metadata()
            .map_err(|_| StoreError::Io { operation: "read metadata" })?
            .len();
        Ok(FileReader::new(file, size))
    }
}

/// Append handle over a buffered file writer
pub struct FileAppender {
    writer: BufWriter<File>,
}

impl LogAppender for FileAppender {
    fn append_line(&mut self, line: &str) -> Result<(), StoreError> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|_| StoreError::Io { operation: "append line" })
    }

    fn close(mut self) -> Result<(), StoreError> {
        self.writer.flush().map_err(|_| StoreError::Io { operation: "flush on close" })
    }
}

/// Read handle with a fixed chunk buffer
pub struct FileReader {
    /// File handle
    file: File,
    /// Size at open time
    size: u64,
    /// Read buffer
    buffer: [u8; READ_CHUNK_SIZE],
    /// Current position in buffer
    buffer_pos: usize,
    /// Valid bytes in buffer
    buffer_len: usize,
    /// Whether we've reached EOF
    eof: bool,
    /// Statistics
    stats: ReadStats,
}

impl FileReader {
    fn new(file: File, size: u64) -> Self {
        Self {
            file,
            size,
            buffer: [0; READ_CHUNK_SIZE],
            buffer_pos: 0,
            buffer_len: 0,
            eof: false,
            stats: ReadStats::default(),
        }
    }

    /// Get statistics
    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    /// Refill buffer from file
    fn refill_buffer(&mut self) -> Result<bool, StoreError> {
        if self.eof {
            return Ok(false);
        }

        self.buffer_pos = 0;
        self.buffer_len = 0;

        let bytes_read = self
            .file
            .read(&mut self.buffer)
            .map_err(|_| StoreError::Io { operation: "read chunk" })?;

        if bytes_read == 0 {
            self.eof = true;
            return Ok(false);
        }

        self.buffer_len = bytes_read;
        self.stats.bytes_read += bytes_read;
        Ok(true)
    }

    /// Decode a completed line and count it
    fn finish_line(&mut self, raw: &RawLine, line: &mut LineBuf) {
        raw.decode_into(line);
        self.stats.lines_read += 1;
        if raw.is_truncated() {
            self.stats.lines_truncated += 1;
        }
    }
}

impl LogReader for FileReader {
    fn size(&self) -> u64 {
        self.size
    }

    fn seek(&mut self, offset: u64) -> Result<(), StoreError> {
        let offset = offset.min(self.size);
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|_| StoreError::Io { operation: "seek" })?;
        self.buffer_pos = 0;
        self.buffer_len = 0;
        self.eof = false;
        Ok(())
    }

    fn read_line(&mut self, line: &mut LineBuf) -> Result<bool, StoreError> {
        line.clear();
        let mut raw = RawLine::new();
        let mut any = false;

        loop {
            // Look for newline in buffer
            while self.buffer_pos < self.buffer_len {
                let byte = self.buffer[self.buffer_pos];
                self.buffer_pos += 1;
                any = true;

                if byte == b'\n' {
                    self.finish_line(&raw, line);
                    return Ok(true);
                }
                raw.push(byte);
            }

            // Need more data
            if !self.refill_buffer()? {
                if any {
                    self.finish_line(&raw, line);
                }
                return Ok(any);
            }
        }
    }
}
