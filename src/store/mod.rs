//! Block Store
//!
//! Content-addressed block storage. Every block is keyed by the identifier of its own
//! bytes, so putting the same bytes twice is a no-op in effect.

pub mod filestore;
pub mod memory;
pub mod sled_store;

use crate::error::StorageError;
use crate::tree::hasher::hash_block;
use crate::types::{Cid, Codec};
use std::path::PathBuf;
use std::sync::Arc;

pub use filestore::{FileRef, FileStore};
pub use memory::MemoryBlockstore;
pub use sled_store::SledBlockstore;

/// A stored unit of content and its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub cid: Cid,
    pub data: Vec<u8>,
}

impl Block {
    /// Hash `data` under `codec` and wrap it.
    pub fn new(codec: Codec, data: Vec<u8>) -> Self {
        let cid = hash_block(codec, &data);
        Block { cid, data }
    }
}

/// Where a raw leaf's bytes live in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOrigin {
    /// Absolute path of the source file.
    pub path: PathBuf,
    /// Offset of the leaf's first byte in that file.
    pub offset: u64,
}

/// Block store interface
pub trait Blockstore: Send + Sync {
    fn put(&self, block: &Block) -> Result<(), StorageError>;

    /// Store a raw leaf that is also available at `origin`.
    ///
    /// Stores that keep their own copy ignore the origin.
    fn put_ref(&self, block: &Block, origin: &BlockOrigin) -> Result<(), StorageError> {
        let _ = origin;
        self.put(block)
    }

    fn get(&self, cid: &Cid) -> Result<Option<Block>, StorageError>;

    fn has(&self, cid: &Cid) -> Result<bool, StorageError>;

    /// Number of distinct blocks held.
    fn len(&self) -> Result<usize, StorageError>;

    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Like [`Blockstore::get`], but a missing block is an error.
    fn require(&self, cid: &Cid) -> Result<Block, StorageError> {
        self.get(cid)?.ok_or(StorageError::NotFound(*cid))
    }
}

impl<T: Blockstore + ?Sized> Blockstore for Box<T> {
    fn put(&self, block: &Block) -> Result<(), StorageError> {
        (**self).put(block)
    }

    fn put_ref(&self, block: &Block, origin: &BlockOrigin) -> Result<(), StorageError> {
        (**self).put_ref(block, origin)
    }

    fn get(&self, cid: &Cid) -> Result<Option<Block>, StorageError> {
        (**self).get(cid)
    }

    fn has(&self, cid: &Cid) -> Result<bool, StorageError> {
        (**self).has(cid)
    }

    fn len(&self) -> Result<usize, StorageError> {
        (**self).len()
    }
}

impl<T: Blockstore + ?Sized> Blockstore for Arc<T> {
    fn put(&self, block: &Block) -> Result<(), StorageError> {
        (**self).put(block)
    }

    fn put_ref(&self, block: &Block, origin: &BlockOrigin) -> Result<(), StorageError> {
        (**self).put_ref(block, origin)
    }

    fn get(&self, cid: &Cid) -> Result<Option<Block>, StorageError> {
        (**self).get(cid)
    }

    fn has(&self, cid: &Cid) -> Result<bool, StorageError> {
        (**self).has(cid)
    }

    fn len(&self) -> Result<usize, StorageError> {
        (**self).len()
    }
}
