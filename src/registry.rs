//! Provider registry
//!
//! The locally known provider table (`providers.json`). It is read once and
//! cached for the lifetime of the owning session; `reload` re-reads it and
//! `invalidate` drops the cache so the next lookup reads it again. Providers
//! are added to the file out of band.

use crate::error::ApiError;
use crate::model::PeerInfo;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ProviderRegistry {
    path: PathBuf,
    cache: RwLock<Option<Arc<Vec<PeerInfo>>>>,
}

impl ProviderRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All known providers, loading the table on first use.
    pub fn list_providers(&self) -> Result<Arc<Vec<PeerInfo>>, ApiError> {
        if let Some(cached) = self.cache.read().as_ref() {
            return Ok(cached.clone());
        }
        self.reload()
    }

    /// Re-read the provider table and replace the cache.
    pub fn reload(&self) -> Result<Arc<Vec<PeerInfo>>, ApiError> {
        let providers = Arc::new(load_providers(&self.path)?);
        tracing::debug!(
            count = providers.len(),
            path = %self.path.display(),
            "loaded provider table"
        );
        *self.cache.write() = Some(providers.clone());
        Ok(providers)
    }

    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    /// Look up a provider's network identity by id.
    pub fn resolve(&self, provider_id: &str) -> Result<PeerInfo, ApiError> {
        self.list_providers()?
            .iter()
            .find(|peer| peer.id == provider_id)
            .cloned()
            .ok_or_else(|| ApiError::ProviderNotFound(provider_id.to_string()))
    }
}

fn load_providers(path: &Path) -> Result<Vec<PeerInfo>, ApiError> {
    let content = std::fs::read(path).map_err(|e| {
        ApiError::ConfigError(format!(
            "Failed to read provider table {}: {}",
            path.display(),
            e
        ))
    })?;
    serde_json::from_slice(&content).map_err(|e| {
        ApiError::ConfigError(format!(
            "Failed to parse provider table {}: {}",
            path.display(),
            e
        ))
    })
}
