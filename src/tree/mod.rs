//! Content trees: node model, file layout, directory assembly and read-back.

pub mod balanced;
pub mod builder;
pub mod hasher;
pub mod node;
pub mod reader;

pub use balanced::{build_file_node, BalancedLayout, DagParams, FileRoot, DEFAULT_MAX_LINKS};
pub use builder::{build_tree, BuildOptions, PathTreeBuilder, TreeRoot};
pub use node::{DagNode, DirectoryNode, FileNode, Link};
