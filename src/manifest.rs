//! Manifest extraction
//!
//! Walks a finished tree and produces a plain name/hash/size snapshot that no longer
//! needs the store. Directory entries are recursed into; everything else is reported from
//! its link alone.

use crate::error::PackError;
use crate::store::Blockstore;
use crate::tree::node::{DagNode, Link};
use crate::types::Cid;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FsNode {
    pub name: String,
    /// Printable content identifier.
    pub hash: String,
    /// Cumulative block bytes. For the root directory this is the encoded node plus every
    /// link size, not a file size of 0.
    pub size: u64,
    #[serde(rename = "Link", default)]
    pub children: Vec<FsNode>,
}

impl FsNode {
    /// Entries in depth-first order with their slash-joined paths, the root excluded.
    pub fn walk(&self) -> Vec<(String, &FsNode)> {
        let mut out = Vec::new();
        let mut stack: Vec<(String, &FsNode)> = self
            .children
            .iter()
            .rev()
            .map(|c| (c.name.clone(), c))
            .collect();
        while let Some((path, node)) = stack.pop() {
            for child in node.children.iter().rev() {
                stack.push((format!("{}/{}", path, child.name), child));
            }
            out.push((path, node));
        }
        out
    }

    /// Indented listing, one entry per line: name, hash, size.
    pub fn render_text(&self) -> String {
        let mut out = format!("/  {}  {}\n", self.hash, self.size);
        for (path, node) in self.walk() {
            let depth = path.matches('/').count() + 1;
            let name = if node.children.is_empty() {
                node.name.clone()
            } else {
                format!("{}/", node.name)
            };
            out.push_str(&format!(
                "{}{}  {}  {}\n",
                "  ".repeat(depth),
                name,
                node.hash,
                node.size
            ));
        }
        out
    }
}

/// Read-only walker over a store.
pub struct ManifestExtractor<'s, S: Blockstore + ?Sized> {
    store: &'s S,
}

impl<'s, S: Blockstore + ?Sized> ManifestExtractor<'s, S> {
    pub fn new(store: &'s S) -> Self {
        ManifestExtractor { store }
    }

    /// Build the manifest rooted at `root`.
    ///
    /// The root must exist and decode as a node; below it, unreadable entries degrade to
    /// childless leaves.
    pub fn build(&self, root: &Cid) -> Result<FsNode, PackError> {
        let block = self.store.require(root)?;
        let node = DagNode::from_block(&block).map_err(|e| {
            PackError::DagIntegrity(format!("root {} is not a tree node: {}", root, e))
        })?;
        let size =
            block.data.len() as u64 + node.links().iter().map(|l| l.size).sum::<u64>();

        let mut fs_node = FsNode {
            name: String::new(),
            hash: root.to_string(),
            size,
            children: Vec::new(),
        };
        if node.is_directory() {
            fs_node.children = node.links().iter().map(|l| self.from_link(l)).collect();
        }
        Ok(fs_node)
    }

    fn from_link(&self, link: &Link) -> FsNode {
        let mut fs_node = FsNode {
            name: link.name.clone(),
            hash: link.cid.to_string(),
            size: link.size,
            children: Vec::new(),
        };

        let block = match self.store.get(&link.cid) {
            Ok(Some(block)) => block,
            Ok(None) => {
                warn!(name = %link.name, cid = %link.cid, "Manifest entry not in store");
                return fs_node;
            }
            Err(e) => {
                warn!(name = %link.name, cid = %link.cid, error = %e, "Failed to fetch manifest entry");
                return fs_node;
            }
        };
        if let Ok(DagNode::Directory(dir)) = DagNode::from_block(&block) {
            fs_node.children = dir.links.iter().map(|l| self.from_link(l)).collect();
        }
        fs_node
    }
}
