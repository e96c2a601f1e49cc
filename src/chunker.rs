//! Fixed-size chunker for splitting a byte stream into blocks.

use crate::error::PackError;
use std::io::{self, ErrorKind, Read};

/// Default chunk size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Largest accepted chunk size.
pub const MAX_CHUNK_SIZE: usize = 64 << 20;

/// Splits a reader into chunks of exactly `chunk_size` bytes; the last may be shorter.
///
/// Short reads from the source are coalesced, so chunk boundaries depend only on the byte
/// offset within the stream.
pub struct Chunker<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> Chunker<R> {
    pub fn new(reader: R, chunk_size: usize) -> Result<Self, PackError> {
        if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
            return Err(PackError::ConfigError(format!(
                "chunk_size must be between 1 and {}, got {}",
                MAX_CHUNK_SIZE, chunk_size
            )));
        }
        Ok(Chunker {
            reader,
            chunk_size,
            done: false,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Next chunk, or `None` once the stream is exhausted. An empty stream yields no
    /// chunks at all.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, PackError> {
        if self.done {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < self.chunk_size {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.done = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(read_error(e)),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some(buf))
    }
}

/// Readers in this crate report range violations as a [`PackError`] wrapped in an
/// `io::Error`; hand those back unchanged.
fn read_error(err: io::Error) -> PackError {
    if !err.get_ref().map_or(false, |inner| inner.is::<PackError>()) {
        return PackError::Chunker(err);
    }
    let kind = err.kind();
    match err.into_inner().map(|inner| inner.downcast::<PackError>()) {
        Some(Ok(pack)) => *pack,
        Some(Err(other)) => PackError::Chunker(io::Error::new(kind, other)),
        None => PackError::Chunker(io::Error::from(kind)),
    }
}

impl<R: Read> Iterator for Chunker<R> {
    type Item = Result<Vec<u8>, PackError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}
