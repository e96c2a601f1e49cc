//! Bounded byte-range reader over a file handle.

use crate::error::PackError;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// Reads `[start, end)` of an underlying file.
///
/// The seek to `start` is deferred to the first read. The file handle is released exactly
/// once, either by [`RangeReader::close`] or on drop.
pub struct RangeReader {
    file: Option<File>,
    start: u64,
    end: u64,
    offset: u64,
    positioned: bool,
}

impl RangeReader {
    /// `end == 0` selects the whole file (`end = file_size`).
    pub fn new(file: File, start: u64, end: u64, file_size: u64) -> Self {
        let end = if end == 0 { file_size } else { end };
        RangeReader {
            file: Some(file),
            start,
            end,
            offset: start,
            positioned: start == 0,
        }
    }

    /// Bytes not yet delivered.
    pub fn remaining(&self) -> Result<u64, PackError> {
        self.end
            .checked_sub(self.offset)
            .ok_or(PackError::OutOfBounds {
                start: self.start,
                end: self.end,
                offset: self.offset,
            })
    }

    /// Release the file handle. Later reads fail; a second close is a no-op.
    pub fn close(&mut self) {
        self.file.take();
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "range reader is closed"))
    }
}

impl Read for RangeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.positioned {
            let start = self.start;
            self.file()?.seek(SeekFrom::Start(start))?;
            self.positioned = true;
        }

        let left = self
            .remaining()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if left == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = buf.len().min(usize::try_from(left).unwrap_or(usize::MAX));
        let n = self.file()?.read(&mut buf[..want])?;
        self.offset += n as u64;
        Ok(n)
    }
}
