//! MergeService: orchestrates sources and deserializes to RepoConfig.

use crate::config::sources::{environment, repo_file};
use crate::config::RepoConfig;
use config::{Config, ConfigError};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: serde defaults (lowest) -> repo file -> environment (highest).
    pub fn load_from_file(path: &Path) -> Result<RepoConfig, ConfigError> {
        let builder = Config::builder();
        let builder = repo_file::add_to_builder(builder, path)?;
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        config.try_deserialize()
    }
}
