//! Archive container
//!
//! An archive is a single stream: a length-prefixed header naming the root, then every
//! reachable block as a length-prefixed `(cid bytes, data)` section.
//!
//! ```text
//! varint(len) header
//! varint(len) cid data
//! varint(len) cid data
//! ...
//! ```
//!
//! Blocks appear in depth-first pre-order from the root, each at most once.

pub mod reader;
pub mod writer;

use crate::chunker::MAX_CHUNK_SIZE;
use crate::types::Cid;
use serde::{Deserialize, Serialize};

pub use reader::{ArchiveReader, LoadedArchive};
pub use writer::{write_archive, ArchiveStats};

/// Only archive version this crate reads or writes.
pub const ARCHIVE_VERSION: u64 = 1;

/// Upper bound on a single section, header included: the largest raw leaf plus room for
/// its identifier, or an internal node of the same size. The writer refuses larger blocks
/// and the reader treats them as corruption.
pub const MAX_SECTION_LEN: u64 = 2 * MAX_CHUNK_SIZE as u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveHeader {
    pub version: u64,
    pub roots: Vec<Cid>,
}

impl ArchiveHeader {
    pub fn new(root: Cid) -> Self {
        ArchiveHeader {
            version: ARCHIVE_VERSION,
            roots: vec![root],
        }
    }
}
