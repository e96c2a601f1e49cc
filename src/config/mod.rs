//! Configuration
//!
//! Layered with the `config` crate: built-in defaults, the user config file, an explicit
//! file, then `DAGCAR__SECTION__KEY` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

use crate::error::PackError;
use crate::export::StoreBackend;
use crate::logging::LoggingConfig;
use crate::tree::balanced::{DagParams, DEFAULT_MAX_LINKS};
use crate::chunker::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use facade::ConfigLoader;

pub use crate::chunker::MAX_CHUNK_SIZE;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_max_links")]
    pub max_links: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_links() -> usize {
    DEFAULT_MAX_LINKS
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        ChunkingConfig {
            chunk_size: default_chunk_size(),
            max_links: default_max_links(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Disk,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// sled directory for the disk backend; unset means a temporary database.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Reference raw leaves in their source files instead of copying them.
    #[serde(default)]
    pub no_copy: bool,
}

impl PackConfig {
    pub fn validate(&self) -> Result<(), PackError> {
        self.params().validate().map_err(|e| match e {
            PackError::ConfigError(msg) => PackError::ConfigError(format!("chunking.{}", msg)),
            other => other,
        })?;
        if self.store.backend == BackendKind::Memory && self.store.path.is_some() {
            return Err(PackError::ConfigError(
                "store.path is only valid with the disk backend".to_string(),
            ));
        }
        Ok(())
    }

    pub fn params(&self) -> DagParams {
        DagParams {
            chunk_size: self.chunking.chunk_size,
            max_links: self.chunking.max_links,
        }
    }

    pub fn backend(&self) -> StoreBackend {
        match self.store.backend {
            BackendKind::Memory => StoreBackend::Memory,
            BackendKind::Disk => StoreBackend::Disk(self.store.path.clone()),
        }
    }
}
