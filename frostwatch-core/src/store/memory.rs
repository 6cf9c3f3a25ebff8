//! In-memory log store for testing and simulation
//!
//! Behaves like the file store byte for byte, plus two switches to simulate a
//! missing card: [`MemoryLogStore::set_mountable`] and
//! [`MemoryLogStore::set_available`].

use alloc::string::String;
use alloc::vec::Vec;

use super::{LogAppender, LogReader, LogStore, RawLine, StoreError};
use crate::record::LineBuf;

/// Log store held in a byte vector
///
/// ## Example
///
/// ```rust
/// use frostwatch_core::store::{LogAppender, LogStore, MemoryLogStore};
///
/// let mut store = MemoryLogStore::new();
/// store.mount().unwrap();
///
/// let mut appender = store.open_append().unwrap();
/// appender.append_line("t,1.0,2.0,0.00,-60").unwrap();
/// appender.close().unwrap();
///
/// assert_eq!(store.lines(), vec!["t,1.0,2.0,0.00,-60"]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryLogStore {
    data: Vec<u8>,
    mounted: bool,
    mountable: bool,
    available: bool,
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogStore {
    /// Empty, unmounted store
    pub fn new() -> Self {
        Self { data: Vec::new(), mounted: false, mountable: true, available: true }
    }

    /// Store preloaded with raw contents
    pub fn with_contents(contents: &str) -> Self {
        let mut store = Self::new();
        store.data.extend_from_slice(contents.as_bytes());
        store
    }

    /// Whether `mount` succeeds
    pub fn set_mountable(&mut self, mountable: bool) {
        self.mountable = mountable;
    }

    /// Whether opens succeed
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Whether the store has been mounted
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Raw contents (lossy for non-UTF-8 bytes)
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Stored lines without their newlines
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }
}

impl LogStore for MemoryLogStore {
    type Appender<'a> = MemoryAppender<'a>;
    type Reader<'a> = MemoryReader<'a>;

    fn mount(&mut self) -> Result<(), StoreError> {
        if !self.mountable {
            return Err(StoreError::NotMounted);
        }
        self.mounted = true;
        Ok(())
    }

    fn open_append(&mut self) -> Result<Self::Appender<'_>, StoreError> {
        if !self.mounted {
            return Err(StoreError::NotMounted);
        }
        if !self.available {
            return Err(StoreError::Unavailable { operation: "open for append" });
        }
        Ok(MemoryAppender { data: &mut self.data })
    }

    fn open_read(&self) -> Result<Self::Reader<'_>, StoreError> {
        if !self.available {
            return Err(StoreError::Unavailable { operation: "open for read" });
        }
        Ok(MemoryReader::new(&self.data))
    }
}

/// Append handle borrowing the store's bytes
pub struct MemoryAppender<'a> {
    data: &'a mut Vec<u8>,
}

impl LogAppender for MemoryAppender<'_> {
    fn append_line(&mut self, line: &str) -> Result<(), StoreError> {
        self.data.extend_from_slice(line.as_bytes());
        self.data.push(b'\n');
        Ok(())
    }

    fn close(self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Read cursor over a byte slice
pub struct MemoryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> MemoryReader<'a> {
    /// Reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.position
    }
}

impl LogReader for MemoryReader<'_> {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn seek(&mut self, offset: u64) -> Result<(), StoreError> {
        self.position = usize::try_from(offset).map_or(self.data.len(), |o| o.min(self.data.len()));
        Ok(())
    }

    fn read_line(&mut self, line: &mut LineBuf) -> Result<bool, StoreError> {
        line.clear();
        if self.position >= self.data.len() {
            return Ok(false);
        }
        let mut raw = RawLine::new();
        while self.position < self.data.len() {
            let byte = self.data[self.position];
            self.position += 1;
            if byte == b'\n' {
                break;
            }
            raw.push(byte);
        }
        raw.decode_into(line);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_switch() {
        let mut store = MemoryLogStore::new();
        store.set_mountable(false);
        assert_eq!(store.mount(), Err(StoreError::NotMounted));
        assert!(!store.is_mounted());

        store.set_mountable(true);
        assert_eq!(store.mount(), Ok(()));
        assert!(store.is_mounted());
    }

    #[test]
    fn unavailable_store_rejects_opens() {
        let mut store = MemoryLogStore::new();
        store.mount().unwrap();
        store.set_available(false);
        assert!(matches!(store.open_append(), Err(StoreError::Unavailable { .. })));
        assert!(matches!(store.open_read(), Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn reader_handles_seek_and_unterminated_tail() {
        let store = MemoryLogStore::with_contents("first\nsecond\r\nthird");
        let mut reader = store.open_read().unwrap();
        let mut line = LineBuf::new();

        reader.seek(3).unwrap();
        assert!(reader.read_line(&mut line).unwrap());
        assert_eq!(line.as_str(), "st");
        assert!(reader.read_line(&mut line).unwrap());
        assert_eq!(line.as_str(), "second");
        assert!(reader.read_line(&mut line).unwrap());
        assert_eq!(line.as_str(), "third");
        assert!(!reader.read_line(&mut line).unwrap());

        reader.seek(1_000).unwrap();
        assert_eq!(reader.position(), store.size() as usize);
    }

    #[test]
    fn long_line_is_truncated() {
        let long = "y".repeat(400);
        let store = MemoryLogStore::with_contents(&long);
        let mut reader = store.open_read().unwrap();
        let mut line = LineBuf::new();
        assert!(reader.read_line(&mut line).unwrap());
        assert_eq!(line.len(), crate::constants::buffers::MAX_LINE_LEN);
    }

    #[test]
    fn accented_lines_read_back_unchanged() {
        let store = MemoryLogStore::with_contents("15 févr. 2024,-4.0\n16 févr. 2024,-3.5\n");
        let mut reader = store.open_read().unwrap();
        let mut line = LineBuf::new();
        assert!(reader.read_line(&mut line).unwrap());
        assert_eq!(line.as_str(), "15 févr. 2024,-4.0");
        assert!(reader.read_line(&mut line).unwrap());
        assert_eq!(line.as_str(), "16 févr. 2024,-3.5");
    }
}
