//! Read file content and resolve paths back out of a store.

use crate::error::PackError;
use crate::store::Blockstore;
use crate::tree::node::DagNode;
use crate::types::{Cid, Codec};
use std::io::Write;

/// Stream the file rooted at `cid` into `out`, returning the bytes written.
pub fn read_file<S: Blockstore + ?Sized, W: Write + ?Sized>(
    store: &S,
    cid: &Cid,
    out: &mut W,
) -> Result<u64, PackError> {
    let block = store.require(cid)?;
    match cid.codec() {
        Codec::Raw => {
            out.write_all(&block.data)?;
            Ok(block.data.len() as u64)
        }
        Codec::Node => match DagNode::from_block(&block)? {
            DagNode::File(file) => {
                let mut written = 0;
                for link in &file.links {
                    written += read_file(store, &link.cid, out)?;
                }
                if written != file.file_size {
                    return Err(PackError::DagIntegrity(format!(
                        "{} declares {} bytes but holds {}",
                        cid, file.file_size, written
                    )));
                }
                Ok(written)
            }
            DagNode::Directory(_) => Err(PackError::DagIntegrity(format!(
                "{} is a directory, not a file",
                cid
            ))),
        },
    }
}

/// Follow `path` (slash separated, relative to `root`) through directory links.
///
/// With duplicate names the first matching entry wins.
pub fn resolve_path<S: Blockstore + ?Sized>(
    store: &S,
    root: &Cid,
    path: &str,
) -> Result<Cid, PackError> {
    let mut current = *root;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let block = store.require(&current)?;
        let dir = match DagNode::from_block(&block) {
            Ok(DagNode::Directory(dir)) => dir,
            _ => {
                return Err(PackError::DagIntegrity(format!(
                    "cannot descend into '{}': {} is not a directory",
                    segment, current
                )))
            }
        };
        current = dir
            .links
            .iter()
            .find(|l| l.name == segment)
            .map(|l| l.cid)
            .ok_or_else(|| PackError::InvalidPath(path.into()))?;
    }
    Ok(current)
}
