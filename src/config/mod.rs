//! Repo configuration
//!
//! `config.json` in the repo home, overlaid with `BLOCKRENT__*` environment
//! variables. Missing keys fall back to the defaults below.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;
pub use paths::{resolve_home, RepoPaths, HOME_ENV};

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::model::{ProviderInfo, StorageOptions, StoragePolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BLOCK_SIZE: usize = 1 << 20;
pub const DEFAULT_MAX_BLOCK_SIZE: u64 = 1 << 30;

/// Repo configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Identifier of the renting user
    pub user_id: String,

    /// Identifier of this node when acting as a provider
    pub node_id: String,

    /// Bind address of the provider endpoint
    pub provider_address: String,

    /// Bytes per data block
    pub block_size: usize,

    /// Recorded with each file; no cipher is applied
    pub encryption_type: String,

    /// Target number of providers per block
    pub redundancy: usize,

    /// Largest block this node accepts as a provider
    pub max_block_size: u64,

    /// Reachability probe deadline per provider
    pub dial_timeout_ms: u64,

    /// Deadline for each request to a provider
    pub request_timeout_ms: u64,

    /// Storage term proposed for new contracts
    pub contract_days: i64,

    pub logging: LoggingConfig,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            node_id: String::new(),
            provider_address: "0.0.0.0:8002".to_string(),
            block_size: DEFAULT_BLOCK_SIZE,
            encryption_type: "aes".to_string(),
            redundancy: 1,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            dial_timeout_ms: 3_000,
            request_timeout_ms: 30_000,
            contract_days: 30,
            logging: LoggingConfig::default(),
        }
    }
}

impl RepoConfig {
    pub fn new(user_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            node_id: node_id.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.user_id.trim().is_empty() {
            return Err(ApiError::ConfigError("user_id cannot be empty".to_string()));
        }
        if self.node_id.trim().is_empty() {
            return Err(ApiError::ConfigError("node_id cannot be empty".to_string()));
        }
        if self.block_size == 0 {
            return Err(ApiError::ConfigError("block_size must be positive".to_string()));
        }
        if self.redundancy == 0 {
            return Err(ApiError::ConfigError("redundancy must be at least 1".to_string()));
        }
        if self.contract_days <= 0 {
            return Err(ApiError::ConfigError(
                "contract_days must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn storage_policy(&self) -> StoragePolicy {
        StoragePolicy {
            block_size: self.block_size,
            redundancy: self.redundancy,
            encryption_type: self.encryption_type.clone(),
        }
    }

    /// Options used when a `put` is given none.
    pub fn default_storage_options(&self, file_name: &str) -> StorageOptions {
        StorageOptions {
            file_name: file_name.to_string(),
            policy: self.storage_policy(),
        }
    }

    /// What this node advertises when serving as a provider.
    pub fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            id: self.node_id.clone(),
            max_block_size: self.max_block_size,
        }
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ApiError> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to write config to {}: {}",
                path.display(),
                e
            ))
        })
    }
}
