//! Repo session
//!
//! A [`Repo`] is one open repo home: its configuration, provider table,
//! metadata cache and the user's root listing. Every operation goes through
//! the session value; nothing is held in globals. One session per home at a
//! time is assumed (there is no file locking).

mod get;
mod put;
mod saga;
mod sync;

pub use sync::{quorum_reached, SyncReport};

use crate::addressing::root_id;
use crate::config::{ConfigLoader, RepoConfig, RepoPaths};
use crate::error::ApiError;
use crate::model::{DirBlock, PeerInfo};
use crate::negotiation::ContractNegotiator;
use crate::provider::{ConnectedProvider, Dialer, HttpDialer, LocalProvider};
use crate::registry::ProviderRegistry;
use crate::store::MetadataCache;
use chrono::{Duration, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Size a metadata object is negotiated at before it is serialized.
pub(crate) const METADATA_NEGOTIATION_SIZE: u64 = 1 << 20;

/// Stable identifiers of the local user and node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub node_id: String,
}

/// Summary printed by `blockrent info`.
#[derive(Debug, Clone, Serialize)]
pub struct RepoInfo {
    pub home: PathBuf,
    pub user_id: String,
    pub node_id: String,
    pub root_id: String,
    pub files: usize,
    pub providers: usize,
    pub root_contracts: usize,
    pub block_size: usize,
    pub redundancy: usize,
    pub provider_address: String,
}

pub struct Repo {
    paths: RepoPaths,
    config: RepoConfig,
    registry: ProviderRegistry,
    metadata: MetadataCache,
    dialer: Arc<dyn Dialer>,
    root: DirBlock,
}

impl Repo {
    /// Create a new repo at `home` and open it.
    ///
    /// Writes the directory layout, a default `config.json`, an empty
    /// `providers.json` and the user's empty root listing. Refuses to touch a
    /// home that already holds a config file.
    pub fn init(home: &Path, identity: Identity) -> Result<Self, ApiError> {
        let paths = RepoPaths::new(home);
        if paths.config_file.exists() {
            return Err(ApiError::ConfigError(format!(
                "Repo already initialised at {}",
                home.display()
            )));
        }
        paths.create_dirs()?;

        let config = RepoConfig::new(identity.user_id, identity.node_id);
        config.validate()?;
        config.save(&paths.config_file)?;
        std::fs::write(&paths.providers_file, b"[]")?;

        let metadata = MetadataCache::new(&paths.user_dir);
        metadata.save_dir(&DirBlock::new_root(&config.user_id))?;
        tracing::info!(home = %home.display(), user_id = %config.user_id, "initialised repo");

        Self::open(home)
    }

    /// Open an existing repo with the HTTP dialer.
    pub fn open(home: &Path) -> Result<Self, ApiError> {
        let config = ConfigLoader::load(home)?;
        let dialer = HttpDialer::new(config.dial_timeout(), config.request_timeout())?;
        Self::open_with(RepoPaths::new(home), config, Arc::new(dialer))
    }

    /// Open a repo with explicit configuration and transport.
    pub fn open_with(
        paths: RepoPaths,
        config: RepoConfig,
        dialer: Arc<dyn Dialer>,
    ) -> Result<Self, ApiError> {
        config.validate()?;
        let registry = ProviderRegistry::new(&paths.providers_file);
        let metadata = MetadataCache::new(&paths.user_dir);
        let root = match metadata.load_dir(&root_id(&config.user_id))? {
            Some(root) => root,
            None => DirBlock::new_root(&config.user_id),
        };
        Ok(Self {
            paths,
            config,
            registry,
            metadata,
            dialer,
            root,
        })
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn paths(&self) -> &RepoPaths {
        &self.paths
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The user's root listing as this session sees it.
    pub fn root(&self) -> &DirBlock {
        &self.root
    }

    /// Display names of stored files, in the order they were added.
    pub fn list_files(&self) -> Vec<String> {
        self.root.file_names()
    }

    pub fn info(&self) -> Result<RepoInfo, ApiError> {
        Ok(RepoInfo {
            home: self.paths.home.clone(),
            user_id: self.config.user_id.clone(),
            node_id: self.config.node_id.clone(),
            root_id: self.root.id.clone(),
            files: self.root.files.len(),
            providers: self.registry.list_providers()?.len(),
            root_contracts: self.root.contracts.len(),
            block_size: self.config.block_size,
            redundancy: self.config.redundancy,
            provider_address: self.config.provider_address.clone(),
        })
    }

    /// Re-read `providers.json`, returning the number of known providers.
    pub fn reload_providers(&self) -> Result<usize, ApiError> {
        Ok(self.registry.reload()?.len())
    }

    /// Provider serving this node's `peer/` store.
    pub fn local_provider(&self) -> Result<LocalProvider, ApiError> {
        LocalProvider::open(
            self.config.provider_info(),
            self.config.contract_days,
            &self.paths.peer_dir,
        )
    }

    /// Dial every known provider concurrently. Unreachable ones are logged
    /// and dropped; table order is preserved.
    pub async fn connect_all(&self) -> Result<Vec<ConnectedProvider>, ApiError> {
        let peers = self.registry.list_providers()?;
        let dials = peers.iter().map(|peer| self.dial(peer));
        let connected: Vec<ConnectedProvider> =
            join_all(dials).await.into_iter().flatten().collect();
        tracing::debug!(
            known = peers.len(),
            connected = connected.len(),
            "dialed providers"
        );
        Ok(connected)
    }

    /// Resolve a provider id through the registry and dial it.
    pub async fn connect(&self, provider_id: &str) -> Result<ConnectedProvider, ApiError> {
        let peer = self.registry.resolve(provider_id)?;
        let link = self.dialer.dial(&peer).await?;
        Ok(ConnectedProvider { peer, link })
    }

    async fn dial(&self, peer: &PeerInfo) -> Option<ConnectedProvider> {
        match self.dialer.dial(peer).await {
            Ok(link) => Some(ConnectedProvider {
                peer: peer.clone(),
                link,
            }),
            Err(e) => {
                tracing::warn!(provider = %peer.id, addr = %peer.addr, error = %e, "dropping unreachable provider");
                None
            }
        }
    }

    fn negotiator(&self) -> ContractNegotiator {
        let end_date = Utc::now() + Duration::days(self.config.contract_days);
        ContractNegotiator::new(self.config.user_id.clone(), Some(end_date))
    }
}

/// Listing name for a file stored without an explicit one.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
