//! No-copy block references.
//!
//! [`FileStore`] wraps another store. Raw leaves written through
//! [`Blockstore::put_ref`] are recorded as `(path, offset, len)` references into a source
//! file under the store root instead of being copied; reads go back to the file and
//! re-verify the bytes. Every other block is delegated to the inner store.

use super::{Block, BlockOrigin, Blockstore};
use crate::error::StorageError;
use crate::tree::hasher::verify_block;
use crate::types::{Cid, Codec};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Location of a referenced leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Path relative to the store root.
    pub path: PathBuf,
    pub offset: u64,
    pub len: u64,
}

pub struct FileStore<S> {
    inner: S,
    root: PathBuf,
    refs: RwLock<HashMap<Cid, FileRef>>,
}

impl<S: Blockstore> FileStore<S> {
    /// Referenced files must live under `root`.
    pub fn new(inner: S, root: impl Into<PathBuf>) -> Self {
        FileStore {
            inner,
            root: root.into(),
            refs: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_ref(&self, cid: &Cid) -> Option<FileRef> {
        self.refs.read().get(cid).cloned()
    }

    /// Number of leaves held by reference.
    pub fn ref_count(&self) -> usize {
        self.refs.read().len()
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn read_ref(&self, cid: &Cid, file_ref: &FileRef) -> Result<Block, StorageError> {
        let path = self.root.join(&file_ref.path);
        let mut file = File::open(&path)?;
        file.seek(SeekFrom::Start(file_ref.offset))?;
        let mut data = Vec::with_capacity(file_ref.len as usize);
        file.take(file_ref.len).read_to_end(&mut data)?;
        verify_block(cid, &data)?;
        Ok(Block { cid: *cid, data })
    }
}

impl<S: Blockstore> Blockstore for FileStore<S> {
    fn put(&self, block: &Block) -> Result<(), StorageError> {
        self.inner.put(block)
    }

    fn put_ref(&self, block: &Block, origin: &BlockOrigin) -> Result<(), StorageError> {
        if block.cid.codec() != Codec::Raw {
            return self.inner.put(block);
        }
        let relative = origin.path.strip_prefix(&self.root).map_err(|_| {
            StorageError::InvalidPath(format!(
                "{} is not under file store root {}",
                origin.path.display(),
                self.root.display()
            ))
        })?;
        trace!(
            cid = %block.cid,
            path = %relative.display(),
            offset = origin.offset,
            "Recording leaf by reference"
        );
        self.refs.write().entry(block.cid).or_insert_with(|| FileRef {
            path: relative.to_path_buf(),
            offset: origin.offset,
            len: block.data.len() as u64,
        });
        Ok(())
    }

    fn get(&self, cid: &Cid) -> Result<Option<Block>, StorageError> {
        if let Some(block) = self.inner.get(cid)? {
            return Ok(Some(block));
        }
        match self.file_ref(cid) {
            Some(file_ref) => self.read_ref(cid, &file_ref).map(Some),
            None => Ok(None),
        }
    }

    fn has(&self, cid: &Cid) -> Result<bool, StorageError> {
        Ok(self.refs.read().contains_key(cid) || self.inner.has(cid)?)
    }

    fn len(&self) -> Result<usize, StorageError> {
        let mut count = self.inner.len()?;
        for cid in self.refs.read().keys() {
            if !self.inner.has(cid)? {
                count += 1;
            }
        }
        Ok(count)
    }
}
