//! MergeService: orchestrates sources, applies merge policy, deserializes to PackConfig.

use super::policy;
use crate::config::sources::{environment, user_file};
use crate::config::PackConfig;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::collections::HashMap;
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> user file -> explicit file -> environment (highest).
    pub fn load(explicit: Option<&Path>) -> Result<PackConfig, ConfigError> {
        Self::compose(explicit, None)
    }

    /// Same layering with the environment taken from `vars` instead of the process.
    pub fn load_with_env(
        explicit: Option<&Path>,
        vars: HashMap<String, String>,
    ) -> Result<PackConfig, ConfigError> {
        Self::compose(explicit, Some(vars))
    }

    fn compose(
        explicit: Option<&Path>,
        vars: Option<HashMap<String, String>>,
    ) -> Result<PackConfig, ConfigError> {
        let builder = policy::builder_with_defaults()?;
        let builder = user_file::add_to_builder(builder)?;
        let builder = add_explicit_file(builder, explicit);
        let builder = environment::add_to_builder(builder, vars)?;

        builder.build()?.try_deserialize()
    }
}

fn add_explicit_file(
    builder: ConfigBuilder<DefaultState>,
    explicit: Option<&Path>,
) -> ConfigBuilder<DefaultState> {
    match explicit {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => builder,
    }
}
