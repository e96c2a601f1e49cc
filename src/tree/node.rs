//! DAG node types and their block encoding.
//!
//! Raw leaves are plain file bytes stored under [`Codec::Raw`]. Everything with links is a
//! [`DagNode`], bincode-encoded and stored under [`Codec::Node`].

use crate::error::StorageError;
use crate::store::Block;
use crate::tree::hasher::hash_block;
use crate::types::{cid_bytes, Cid, Codec};
use serde::{Deserialize, Serialize};

/// Named reference to a child block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    #[serde(with = "cid_bytes")]
    pub cid: Cid,
    /// Cumulative size: the child block plus everything reachable from it.
    pub size: u64,
}

/// Directory node representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Entries in insertion order; names are not deduplicated.
    pub links: Vec<Link>,
}

impl DirectoryNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_link(&mut self, name: impl Into<String>, cid: Cid, size: u64) {
        self.links.push(Link {
            name: name.into(),
            cid,
            size,
        });
    }
}

/// Internal node of a chunked file. Children are raw leaves or further file nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Logical bytes covered by this node.
    pub file_size: u64,
    /// Logical bytes under each link, parallel to `links`.
    pub block_sizes: Vec<u64>,
    pub links: Vec<Link>,
}

impl FileNode {
    pub fn add_child(&mut self, cid: Cid, cumulative_size: u64, file_size: u64) {
        self.links.push(Link {
            name: String::new(),
            cid,
            size: cumulative_size,
        });
        self.block_sizes.push(file_size);
        self.file_size += file_size;
    }
}

/// Structured node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DagNode {
    Directory(DirectoryNode),
    File(FileNode),
}

impl DagNode {
    pub fn is_directory(&self) -> bool {
        matches!(self, DagNode::Directory(_))
    }

    pub fn links(&self) -> &[Link] {
        match self {
            DagNode::Directory(dir) => &dir.links,
            DagNode::File(file) => &file.links,
        }
    }

    /// Logical content size; zero for directories.
    pub fn file_size(&self) -> u64 {
        match self {
            DagNode::Directory(_) => 0,
            DagNode::File(file) => file.file_size,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, StorageError> {
        Ok(bincode::deserialize(data)?)
    }

    /// Decode a block, rejecting anything not stored under [`Codec::Node`].
    pub fn from_block(block: &Block) -> Result<Self, StorageError> {
        if block.cid.codec() != Codec::Node {
            return Err(StorageError::Encoding(format!(
                "{} is a raw block, not a node",
                block.cid
            )));
        }
        Self::decode(&block.data)
    }

    /// Encode into a block and report its cumulative size.
    pub fn to_block(&self) -> Result<(Block, u64), StorageError> {
        let data = self.encode()?;
        let cumulative = data.len() as u64 + self.links().iter().map(|l| l.size).sum::<u64>();
        let cid = hash_block(Codec::Node, &data);
        Ok((Block { cid, data }, cumulative))
    }
}
