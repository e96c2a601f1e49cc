//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::PackConfig;
use crate::error::PackError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, user config file, then environment. Validated.
    pub fn load() -> Result<PackConfig, PackError> {
        let config = MergeService::load(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`ConfigLoader::load`] with `path` layered over the user config file.
    pub fn load_from_file(path: &Path) -> Result<PackConfig, PackError> {
        let config = MergeService::load(Some(path))?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> PackConfig {
        PackConfig::default()
    }
}
