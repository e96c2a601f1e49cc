//! Read an archive stream back into blocks.

use super::{ArchiveHeader, ARCHIVE_VERSION, MAX_SECTION_LEN};
use crate::error::PackError;
use crate::store::{Block, Blockstore};
use crate::tree::hasher::verify_block;
use crate::types::Cid;
use crate::varint::read_uvarint;
use std::io::Read;
use tracing::debug;

/// Summary of a fully loaded archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedArchive {
    pub roots: Vec<Cid>,
    pub blocks: u64,
    pub block_bytes: u64,
}

impl LoadedArchive {
    /// The single root this crate writes.
    pub fn root(&self) -> Result<Cid, PackError> {
        match self.roots.as_slice() {
            [root] => Ok(*root),
            other => Err(PackError::Archive(format!(
                "expected exactly one root, found {}",
                other.len()
            ))),
        }
    }
}

/// Streaming reader. The header is parsed on construction; blocks are verified against
/// their identifiers as they are read.
pub struct ArchiveReader<R> {
    reader: R,
    header: ArchiveHeader,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(mut reader: R) -> Result<Self, PackError> {
        let data = read_section(&mut reader)?
            .ok_or_else(|| PackError::Archive("empty archive".to_string()))?;
        let header: ArchiveHeader = bincode::deserialize(&data)
            .map_err(|e| PackError::Archive(format!("invalid header: {}", e)))?;
        if header.version != ARCHIVE_VERSION {
            return Err(PackError::Archive(format!(
                "unsupported archive version {}",
                header.version
            )));
        }
        Ok(ArchiveReader { reader, header })
    }

    /// Verify and load a whole archive into `store`, returning its roots.
    pub fn load<S: Blockstore + ?Sized>(reader: R, store: &S) -> Result<Vec<Cid>, PackError> {
        Ok(Self::new(reader)?.load_into(store)?.roots)
    }

    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    pub fn roots(&self) -> &[Cid] {
        &self.header.roots
    }

    /// Next verified block, or `None` at a clean end of stream.
    pub fn next_block(&mut self) -> Result<Option<Block>, PackError> {
        let Some(section) = read_section(&mut self.reader)? else {
            return Ok(None);
        };
        let (cid, used) = Cid::read_bytes(&section)
            .map_err(|e| PackError::Archive(format!("invalid block identifier: {}", e)))?;
        let data = section[used..].to_vec();
        verify_block(&cid, &data)
            .map_err(|e| PackError::Archive(format!("block failed verification: {}", e)))?;
        Ok(Some(Block { cid, data }))
    }

    /// Read every remaining block into `store`.
    pub fn load_into<S: Blockstore + ?Sized>(
        mut self,
        store: &S,
    ) -> Result<LoadedArchive, PackError> {
        let mut loaded = LoadedArchive {
            roots: self.header.roots.clone(),
            blocks: 0,
            block_bytes: 0,
        };
        while let Some(block) = self.next_block()? {
            store.put(&block)?;
            loaded.blocks += 1;
            loaded.block_bytes += block.data.len() as u64;
        }
        for root in &loaded.roots {
            if !store.has(root)? {
                return Err(PackError::Archive(format!("root {} not in archive", root)));
            }
        }
        debug!(blocks = loaded.blocks, bytes = loaded.block_bytes, "Loaded archive");
        Ok(loaded)
    }
}

impl<R: Read> Iterator for ArchiveReader<R> {
    type Item = Result<Block, PackError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block().transpose()
    }
}

fn read_section<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, PackError> {
    let len = match read_uvarint(reader) {
        Ok(Some(len)) => len,
        Ok(None) => return Ok(None),
        Err(e) => return Err(PackError::Archive(format!("invalid section length: {}", e))),
    };
    if len > MAX_SECTION_LEN {
        return Err(PackError::Archive(format!(
            "section of {} bytes exceeds limit",
            len
        )));
    }
    // Grow with the bytes actually present instead of trusting the prefix.
    let mut data = Vec::new();
    reader
        .by_ref()
        .take(len)
        .read_to_end(&mut data)
        .map_err(|e| PackError::Archive(format!("truncated section: {}", e)))?;
    if (data.len() as u64) < len {
        return Err(PackError::Archive(format!(
            "truncated section: {} of {} bytes",
            data.len(),
            len
        )));
    }
    Ok(Some(data))
}
