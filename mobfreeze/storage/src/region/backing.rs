//! Byte stores a region file can live on.
//!
//! The region container only needs positioned reads and writes plus the
//! ability to query and change the store's length. [`RegionBacking`]
//! captures that, so the same container logic runs against a real file or
//! against an in-memory buffer in tests.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// A seekable byte store that can be resized and synced.
pub trait RegionBacking: Read + Write + Seek {
    /// Current length in bytes.
    fn byte_len(&self) -> io::Result<u64>;

    /// Truncates or zero-extends the store to `len` bytes.
    fn set_byte_len(&mut self, len: u64) -> io::Result<()>;

    /// Flushes buffered data and makes it durable.
    fn sync(&mut self) -> io::Result<()>;
}

impl RegionBacking for File {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn set_byte_len(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

/// In-memory backing store.
#[derive(Debug, Default, Clone)]
pub struct MemoryBacking {
    cursor: Cursor<Vec<u8>>,
}

impl MemoryBacking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps existing bytes, positioned at the start.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.cursor.get_ref()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl Read for MemoryBacking {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Write for MemoryBacking {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.cursor.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryBacking {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl RegionBacking for MemoryBacking {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.cursor.get_ref().len() as u64)
    }

    fn set_byte_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length exceeds memory"))?;
        self.cursor.get_mut().resize(len, 0);
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}
