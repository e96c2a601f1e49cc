//! Balanced file layout
//!
//! Turns one file (or byte range) into a tree of raw leaves under internal [`FileNode`]s.
//! The first leaf starts as the root. Each round wraps the current root as the first
//! child of a new node and fills that node with full subtrees one level shallower, so the
//! tree only grows in depth once every node below is at `max_links` children.

use crate::chunker::{Chunker, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use crate::concurrency::CancelToken;
use crate::error::PackError;
use crate::source::FileDescriptor;
use crate::store::{Block, BlockOrigin, Blockstore};
use crate::tree::node::{DagNode, FileNode};
use crate::types::{Cid, Codec};
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

/// Default fan-out of internal file nodes.
pub const DEFAULT_MAX_LINKS: usize = 1 << 10;

/// Layout parameters. They are part of the content identity: changing either changes
/// every multi-chunk file's root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DagParams {
    pub chunk_size: usize,
    pub max_links: usize,
}

impl DagParams {
    /// Reject parameters the layout cannot make progress with.
    pub fn validate(&self) -> Result<(), PackError> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(PackError::ConfigError(format!(
                "chunk_size must be between 1 and {}, got {}",
                MAX_CHUNK_SIZE, self.chunk_size
            )));
        }
        // A single-link node never absorbs a chunk.
        if self.max_links < 2 {
            return Err(PackError::ConfigError(format!(
                "max_links must be at least 2, got {}",
                self.max_links
            )));
        }
        Ok(())
    }
}

impl Default for DagParams {
    fn default() -> Self {
        DagParams {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_links: DEFAULT_MAX_LINKS,
        }
    }
}

/// A committed file tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRoot {
    pub cid: Cid,
    /// Cumulative block bytes under the root.
    pub size: u64,
    /// Logical file bytes.
    pub file_size: u64,
}

/// One-chunk lookahead so the layout can tell whether more data follows.
struct Lookahead<'c, R> {
    chunker: &'c mut Chunker<R>,
    pending: Option<Vec<u8>>,
    cancel: &'c CancelToken,
}

impl<R: Read> Lookahead<'_, R> {
    fn is_done(&mut self) -> Result<bool, PackError> {
        if self.pending.is_none() {
            self.pending = self.chunker.next_chunk()?;
        }
        Ok(self.pending.is_none())
    }

    fn next(&mut self) -> Result<Option<Vec<u8>>, PackError> {
        self.cancel.check()?;
        if let Some(chunk) = self.pending.take() {
            return Ok(Some(chunk));
        }
        self.chunker.next_chunk()
    }
}

/// Builds a balanced tree from a chunk stream into a store.
pub struct BalancedLayout<'s, S: Blockstore + ?Sized> {
    store: &'s S,
    params: DagParams,
    origin: Option<PathBuf>,
    offset: u64,
    cancel: CancelToken,
}

impl<'s, S: Blockstore + ?Sized> BalancedLayout<'s, S> {
    pub fn new(store: &'s S, params: DagParams) -> Self {
        BalancedLayout {
            store,
            params,
            origin: None,
            offset: 0,
            cancel: CancelToken::new(),
        }
    }

    /// Source file the chunks come from, handed to the store with every leaf.
    pub fn with_origin(mut self, path: impl Into<PathBuf>) -> Self {
        self.origin = Some(path.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Offset in the source file of the first chunk's first byte.
    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    pub fn layout<R: Read>(&mut self, chunker: &mut Chunker<R>) -> Result<FileRoot, PackError> {
        self.params.validate()?;
        let cancel = self.cancel.clone();
        let mut source = Lookahead {
            chunker,
            pending: None,
            cancel: &cancel,
        };

        let first = source.next()?.unwrap_or_default();
        let mut root = self.add_leaf(first)?;

        let mut depth = 1;
        while !source.is_done()? {
            let mut node = FileNode::default();
            node.add_child(root.cid, root.size, root.file_size);
            self.fill(&mut node, depth, &mut source)?;
            root = self.commit(node)?;
            depth += 1;
        }
        Ok(root)
    }

    fn fill<R: Read>(
        &mut self,
        node: &mut FileNode,
        depth: usize,
        source: &mut Lookahead<'_, R>,
    ) -> Result<(), PackError> {
        while node.links.len() < self.params.max_links && !source.is_done()? {
            let child = if depth == 1 {
                match source.next()? {
                    Some(data) => self.add_leaf(data)?,
                    None => break,
                }
            } else {
                let mut inner = FileNode::default();
                self.fill(&mut inner, depth - 1, source)?;
                self.commit(inner)?
            };
            node.add_child(child.cid, child.size, child.file_size);
        }
        Ok(())
    }

    fn add_leaf(&mut self, data: Vec<u8>) -> Result<FileRoot, PackError> {
        let len = data.len() as u64;
        let block = Block::new(Codec::Raw, data);
        match &self.origin {
            Some(path) => self.store.put_ref(
                &block,
                &BlockOrigin {
                    path: path.clone(),
                    offset: self.offset,
                },
            )?,
            None => self.store.put(&block)?,
        }
        self.offset += len;
        Ok(FileRoot {
            cid: block.cid,
            size: len,
            file_size: len,
        })
    }

    fn commit(&mut self, node: FileNode) -> Result<FileRoot, PackError> {
        let file_size = node.file_size;
        let (block, size) = DagNode::File(node).to_block()?;
        self.store.put(&block)?;
        Ok(FileRoot {
            cid: block.cid,
            size,
            file_size,
        })
    }
}

/// Ingest one normalized descriptor into `store`.
///
/// Sub-ranges are read through a range reader; the layout is tagged with the range start
/// so leaf origins point at their absolute position in the source file. Reading more or
/// fewer bytes than the descriptor covers fails with [`PackError::OutOfBounds`].
pub fn build_file_node<S: Blockstore + ?Sized>(
    store: &S,
    desc: &FileDescriptor,
    params: DagParams,
    cancel: &CancelToken,
) -> Result<FileRoot, PackError> {
    params.validate()?;
    let reader = desc.open()?;
    let mut chunker = Chunker::new(reader, params.chunk_size)?;
    let mut layout = BalancedLayout::new(store, params)
        .with_origin(desc.path.clone())
        .with_cancel(cancel.clone());
    layout.set_offset(desc.start);
    let root = layout.layout(&mut chunker)?;
    if root.file_size != desc.len() {
        // The file changed size between planning and reading.
        return Err(PackError::OutOfBounds {
            start: desc.start,
            end: desc.end,
            offset: desc.start + root.file_size,
        });
    }
    debug!(
        path = %desc.path.display(),
        start = desc.start,
        end = desc.end,
        cid = %root.cid,
        "Built file node"
    );
    Ok(root)
}
