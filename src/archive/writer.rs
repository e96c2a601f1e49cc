//! Serialize a committed tree into an archive stream.

use super::{ArchiveHeader, MAX_SECTION_LEN};
use crate::error::PackError;
use crate::store::Blockstore;
use crate::tree::node::DagNode;
use crate::types::{Cid, Codec};
use crate::varint::encode_uvarint;
use std::collections::HashSet;
use std::io::Write;
use tracing::debug;

/// What a write produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub blocks: u64,
    /// Block payload bytes, framing excluded.
    pub block_bytes: u64,
    /// Everything written to the sink.
    pub archive_bytes: u64,
}

/// Write the archive for `root` into `sink`.
///
/// Every block reachable from the root must be in `store`; a missing one aborts the write
/// with whatever was already written left in the sink.
pub fn write_archive<S: Blockstore + ?Sized, W: Write>(
    store: &S,
    root: &Cid,
    mut sink: W,
) -> Result<ArchiveStats, PackError> {
    let mut stats = ArchiveStats::default();

    let header = bincode::serialize(&ArchiveHeader::new(*root))
        .map_err(|e| PackError::Archive(format!("failed to encode header: {}", e)))?;
    stats.archive_bytes += write_section(&mut sink, &[&header])?;

    let mut seen = HashSet::new();
    let mut stack = vec![*root];
    while let Some(cid) = stack.pop() {
        if !seen.insert(cid) {
            continue;
        }
        let block = store.require(&cid)?;
        if cid.codec() == Codec::Node {
            let node = DagNode::from_block(&block)?;
            // Reverse so the first link is visited next.
            stack.extend(node.links().iter().rev().map(|l| l.cid));
        }

        let cid_bytes = cid.to_bytes();
        stats.archive_bytes += write_section(&mut sink, &[&cid_bytes, &block.data])?;
        stats.blocks += 1;
        stats.block_bytes += block.data.len() as u64;
    }
    sink.flush()?;

    debug!(
        root = %root,
        blocks = stats.blocks,
        bytes = stats.archive_bytes,
        "Wrote archive"
    );
    Ok(stats)
}

fn write_section<W: Write>(sink: &mut W, parts: &[&[u8]]) -> Result<u64, PackError> {
    let len: usize = parts.iter().map(|p| p.len()).sum();
    if len as u64 > MAX_SECTION_LEN {
        return Err(PackError::Archive(format!(
            "section of {} bytes exceeds limit",
            len
        )));
    }
    let mut prefix = Vec::with_capacity(crate::varint::MAX_VARINT_LEN);
    encode_uvarint(len as u64, &mut prefix);
    sink.write_all(&prefix)?;
    for part in parts {
        sink.write_all(part)?;
    }
    Ok((prefix.len() + len) as u64)
}
