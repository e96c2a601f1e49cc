//! Built-in defaults, the lowest-precedence layer.

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::tree::balanced::DEFAULT_MAX_LINKS;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("chunking.chunk_size", DEFAULT_CHUNK_SIZE as u64)?
        .set_default("chunking.max_links", DEFAULT_MAX_LINKS as u64)?
        .set_default("store.backend", "memory")?
        .set_default("store.no_copy", false)
}
