//! Error types for packing and block storage.

use crate::types::Cid;
use std::path::PathBuf;

/// Errors raised by block stores.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("block not found: {0}")]
    NotFound(Cid),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Bytes read back do not hash to the identifier they were stored under.
    #[error("block corruption detected: expected {expected}, actual {actual}")]
    Corrupt { expected: Cid, actual: Cid },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Io(e) => StorageError::IoError(e),
            other => StorageError::Backend(other.to_string()),
        }
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Encoding(err.to_string())
    }
}

/// Errors surfaced by tree building, archive export and archive reading.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// A source file could not be opened, read or seeked.
    #[error("source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Range arithmetic went negative, usually because the file changed underneath us.
    #[error("read out of bounds of slice [{start}, {end}) at offset {offset}")]
    OutOfBounds { start: u64, end: u64, offset: u64 },

    #[error("invalid byte range [{start}, {end}) for {path} of size {size}")]
    InvalidRange {
        path: PathBuf,
        start: u64,
        end: u64,
        size: u64,
    },

    /// A node is not the structure the caller needed.
    #[error("DAG integrity error: {0}")]
    DagIntegrity(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("chunker error: {0}")]
    Chunker(#[source] std::io::Error),

    #[error("path is not a valid entry under the source root: {0}")]
    InvalidPath(PathBuf),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("build cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for PackError {
    fn from(err: config::ConfigError) -> Self {
        PackError::ConfigError(err.to_string())
    }
}
