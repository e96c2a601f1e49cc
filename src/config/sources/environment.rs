//! Environment variable source: DAGCAR__ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;
use std::collections::HashMap;

/// Add environment variable overlay to builder.
///
/// `DAGCAR__CHUNKING__CHUNK_SIZE=65536` sets `chunking.chunk_size`. When `vars` is given it
/// replaces the process environment.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    vars: Option<HashMap<String, String>>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("DAGCAR")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(vars),
    );
    Ok(builder)
}
