//! In-memory block store.

use super::{Block, Blockstore};
use crate::error::StorageError;
use crate::types::Cid;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;

/// Block store backed by a `RwLock<HashMap>`.
#[derive(Default)]
pub struct MemoryBlockstore {
    blocks: RwLock<HashMap<Cid, Vec<u8>>>,
}

impl MemoryBlockstore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes held.
    pub fn used_bytes(&self) -> u64 {
        self.blocks.read().values().map(|v| v.len() as u64).sum()
    }
}

impl Blockstore for MemoryBlockstore {
    fn put(&self, block: &Block) -> Result<(), StorageError> {
        let mut map = self.blocks.write();
        if !map.contains_key(&block.cid) {
            trace!(cid = %block.cid, size = block.data.len(), "Storing block in memory");
            map.insert(block.cid, block.data.clone());
        }
        Ok(())
    }

    fn get(&self, cid: &Cid) -> Result<Option<Block>, StorageError> {
        Ok(self.blocks.read().get(cid).map(|data| Block {
            cid: *cid,
            data: data.clone(),
        }))
    }

    fn has(&self, cid: &Cid) -> Result<bool, StorageError> {
        Ok(self.blocks.read().contains_key(cid))
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.blocks.read().len())
    }
}
