//! dagcar: Deterministic Content-Addressed Archives
//!
//! Packs a path-sorted list of files (or byte ranges of files) into a content-addressed
//! DAG, writes every reachable block into a single archive, and describes the result with
//! a name/hash/size manifest. The same input always yields the same root identifier.

pub mod archive;
pub mod chunker;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod manifest;
pub mod source;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod varint;

pub use error::{PackError, StorageError};
pub use export::{generate_archive, pack_graphs, ExportOptions, ExportResult, StoreBackend};
pub use manifest::FsNode;
pub use source::FileDescriptor;
pub use types::Cid;
