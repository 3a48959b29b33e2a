//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::paths::RepoPaths;
use super::RepoConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the configuration of the repo at `home`.
    pub fn load(home: &Path) -> Result<RepoConfig, ApiError> {
        Self::load_from_file(&RepoPaths::new(home).config_file)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<RepoConfig, ApiError> {
        let config = MergeService::load_from_file(path).map_err(|e| {
            ApiError::ConfigError(format!("Cannot load config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }
}
