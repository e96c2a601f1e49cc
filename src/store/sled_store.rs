//! Disk-backed block store on sled.

use super::{Block, Blockstore};
use crate::error::StorageError;
use crate::tree::hasher::verify_block;
use crate::types::Cid;
use std::path::Path;
use tracing::debug;

/// Block store persisted in a sled database, keyed by the binary identifier.
///
/// Reads re-hash the stored bytes, so on-disk corruption surfaces as
/// [`StorageError::Corrupt`] instead of a wrong archive.
pub struct SledBlockstore {
    db: sled::Db,
}

impl SledBlockstore {
    /// Open (or create) a store at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        debug!(path = %path.display(), "Opened sled block store");
        Ok(SledBlockstore { db })
    }

    /// A store that sled deletes when it is dropped.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(SledBlockstore { db })
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

impl Blockstore for SledBlockstore {
    fn put(&self, block: &Block) -> Result<(), StorageError> {
        self.db
            .insert(block.cid.to_bytes(), block.data.as_slice())?;
        Ok(())
    }

    fn get(&self, cid: &Cid) -> Result<Option<Block>, StorageError> {
        match self.db.get(cid.to_bytes())? {
            Some(bytes) => {
                verify_block(cid, &bytes)?;
                Ok(Some(Block {
                    cid: *cid,
                    data: bytes.to_vec(),
                }))
            }
            None => Ok(None),
        }
    }

    fn has(&self, cid: &Cid) -> Result<bool, StorageError> {
        Ok(self.db.contains_key(cid.to_bytes())?)
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.db.len())
    }
}
