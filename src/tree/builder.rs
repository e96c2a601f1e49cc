//! Incremental directory tree construction
//!
//! The builder keeps only the currently open directory path on an explicit stack. Each new
//! leaf closes every open level it does not share with the previous path: those subtrees
//! can no longer grow, so they are hashed, committed, and linked into their parent.
//!
//! This relies on the input being sorted so that paths sharing a prefix are contiguous.
//! The order is not checked. Unsorted input reopens an already-closed directory name and
//! yields a second, separate entry under that name.

use crate::concurrency::CancelToken;
use crate::error::PackError;
use crate::source::{path_segments, scratch, FileDescriptor};
use crate::store::Blockstore;
use crate::tree::balanced::{build_file_node, DagParams, FileRoot};
use crate::tree::node::{DagNode, DirectoryNode};
use crate::types::Cid;
use std::path::Path;
use tracing::{debug, info};

/// Committed root of a directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRoot {
    pub cid: Cid,
    /// Cumulative block bytes under the root.
    pub size: u64,
}

enum OpenNode {
    Directory(DirectoryNode),
    Leaf(FileRoot),
}

struct Frame {
    name: String,
    node: OpenNode,
}

/// Stack-based builder over a sorted stream of `(segments, leaf)` pairs.
pub struct PathTreeBuilder<'s, S: Blockstore + ?Sized> {
    store: &'s S,
    stack: Vec<Frame>,
    directories: usize,
    leaves: usize,
}

impl<'s, S: Blockstore + ?Sized> PathTreeBuilder<'s, S> {
    pub fn new(store: &'s S) -> Self {
        PathTreeBuilder {
            store,
            stack: vec![Frame {
                name: String::new(),
                node: OpenNode::Directory(DirectoryNode::new()),
            }],
            directories: 0,
            leaves: 0,
        }
    }

    /// Open levels below the root.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Attach an already committed leaf at `segments` (root segment first).
    pub fn push(&mut self, segments: &[String], leaf: FileRoot) -> Result<(), PackError> {
        if segments.len() < 2 || !segments[0].is_empty() {
            return Err(PackError::DagIntegrity(format!(
                "path segments must start at the root and name an entry: {:?}",
                segments
            )));
        }

        let common = self.common_prefix(segments);
        self.close_to(common)?;

        let last = segments.len() - 1;
        for name in &segments[common..last] {
            self.stack.push(Frame {
                name: name.clone(),
                node: OpenNode::Directory(DirectoryNode::new()),
            });
        }
        self.stack.push(Frame {
            name: segments[last].clone(),
            node: OpenNode::Leaf(leaf),
        });
        self.leaves += 1;
        Ok(())
    }

    /// Close every open level and commit the root.
    pub fn finish(mut self) -> Result<TreeRoot, PackError> {
        self.close_to(1)?;
        let root = match self.stack.pop() {
            Some(Frame {
                node: OpenNode::Directory(dir),
                ..
            }) => dir,
            _ => {
                return Err(PackError::DagIntegrity(
                    "build stack lost its root directory".to_string(),
                ))
            }
        };
        let (cid, size) = self.commit_directory(root)?;
        debug!(
            %cid,
            leaves = self.leaves,
            directories = self.directories,
            "Committed root directory"
        );
        Ok(TreeRoot { cid, size })
    }

    /// Shared prefix length with the open path. An open leaf never counts as a shared
    /// directory, and the new leaf's own name is never shared, so every push adds an entry.
    fn common_prefix(&self, segments: &[String]) -> usize {
        let open_dirs = match self.stack.last() {
            Some(Frame {
                node: OpenNode::Leaf(_),
                ..
            }) => self.stack.len() - 1,
            _ => self.stack.len(),
        };
        let limit = open_dirs.min(segments.len() - 1);
        self.stack
            .iter()
            .zip(segments)
            .take(limit)
            .take_while(|(frame, segment)| frame.name == **segment)
            .count()
    }

    fn close_to(&mut self, depth: usize) -> Result<(), PackError> {
        while self.stack.len() > depth.max(1) {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            let (cid, size) = match frame.node {
                OpenNode::Directory(dir) => self.commit_directory(dir)?,
                OpenNode::Leaf(leaf) => (leaf.cid, leaf.size),
            };
            match self.stack.last_mut() {
                Some(Frame {
                    node: OpenNode::Directory(parent),
                    ..
                }) => parent.add_link(frame.name, cid, size),
                Some(Frame { name, .. }) => {
                    return Err(PackError::DagIntegrity(format!(
                        "cannot attach '{}' under non-directory '{}'",
                        frame.name, name
                    )))
                }
                None => {
                    return Err(PackError::DagIntegrity(
                        "closed past the root directory".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }

    fn commit_directory(&mut self, dir: DirectoryNode) -> Result<(Cid, u64), PackError> {
        let (block, size) = DagNode::Directory(dir).to_block()?;
        self.store.put(&block)?;
        self.directories += 1;
        Ok((block.cid, size))
    }
}

/// Where and how descriptors are ingested.
#[derive(Debug, Clone)]
pub struct BuildOptions<'a> {
    /// Root the descriptor paths are relative to.
    pub source_root: &'a Path,
    /// When set, each range is copied here first and the copy is ingested.
    pub scratch_dir: Option<&'a Path>,
    pub params: DagParams,
    pub cancel: CancelToken,
}

/// Ingest `files` in order and return the committed root directory.
pub fn build_tree<S: Blockstore + ?Sized>(
    store: &S,
    files: &[FileDescriptor],
    options: &BuildOptions<'_>,
) -> Result<TreeRoot, PackError> {
    options.params.validate()?;
    let mut builder = PathTreeBuilder::new(store);
    for item in files {
        options.cancel.check()?;
        let item = item.normalized()?;
        let segments = path_segments(options.source_root, &item.path)?;

        let ingest = match options.scratch_dir {
            Some(scratch_dir) => {
                let relative = segments[1..].iter().collect::<std::path::PathBuf>();
                scratch::materialize(&item, &relative, scratch_dir)?
            }
            None => item,
        };

        let leaf = build_file_node(store, &ingest, options.params, &options.cancel)?;
        builder.push(&segments, leaf)?;
    }
    let root = builder.finish()?;
    info!(root = %root.cid, files = files.len(), "Built directory tree");
    Ok(root)
}
