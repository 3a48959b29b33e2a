//! In-memory providers and dialer for driving a `Repo` without a network.

use async_trait::async_trait;
use blockrent::config::{RepoConfig, RepoPaths};
use blockrent::error::{ApiError, StorageError};
use blockrent::model::{Contract, PeerInfo, ProviderInfo};
use blockrent::provider::{Dialer, ProviderLink};
use blockrent::repo::Repo;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const USER: &str = "alice";

pub struct MemoryProvider {
    pub id: String,
    max_block_size: u64,
    accepts: AtomicBool,
    fail_updates: AtomicBool,
    fail_store_ids: Mutex<HashSet<String>>,
    blocks: Mutex<HashMap<String, Vec<u8>>>,
    cancels: AtomicUsize,
    rewrite: Mutex<Option<(PathBuf, Vec<u8>)>>,
}

impl MemoryProvider {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            max_block_size: 1 << 30,
            accepts: AtomicBool::new(true),
            fail_updates: AtomicBool::new(false),
            fail_store_ids: Mutex::new(HashSet::new()),
            blocks: Mutex::new(HashMap::new()),
            cancels: AtomicUsize::new(0),
            rewrite: Mutex::new(None),
        })
    }

    pub fn rejecting(id: &str) -> Arc<Self> {
        let provider = Self::new(id);
        provider.accepts.store(false, Ordering::SeqCst);
        provider
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_store_of(&self, id: &str) {
        self.fail_store_ids.lock().insert(id.to_string());
    }

    pub fn holds(&self, id: &str) -> bool {
        self.blocks.lock().contains_key(id)
    }

    pub fn block(&self, id: &str) -> Option<Vec<u8>> {
        self.blocks.lock().get(id).cloned()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.lock().len()
    }

    /// Replace stored bytes behind the store's back.
    pub fn corrupt(&self, id: &str, data: &[u8]) {
        self.blocks.lock().insert(id.to_string(), data.to_vec());
    }

    /// Overwrite `path` with `contents` during the next negotiation, after
    /// the renter has read the file once.
    pub fn rewrite_on_negotiate(&self, path: &Path, contents: &[u8]) {
        *self.rewrite.lock() = Some((path.to_path_buf(), contents.to_vec()));
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderLink for MemoryProvider {
    async fn info(&self) -> Result<ProviderInfo, ApiError> {
        Ok(ProviderInfo {
            id: self.id.clone(),
            max_block_size: self.max_block_size,
        })
    }

    async fn negotiate(&self, contract: &Contract) -> Result<Contract, ApiError> {
        if let Some((path, contents)) = self.rewrite.lock().take() {
            std::fs::write(path, contents).unwrap();
        }
        let mut answer = contract.clone();
        if self.accepts.load(Ordering::SeqCst) {
            answer.provider_signature = answer.sign_terms(&self.id);
        }
        Ok(answer)
    }

    async fn store_block(&self, id: &str, data: &[u8]) -> Result<(), ApiError> {
        if self.fail_store_ids.lock().contains(id) {
            return Err(ApiError::unreachable(&self.id, "connection reset"));
        }
        let mut blocks = self.blocks.lock();
        if blocks.contains_key(id) {
            return Err(StorageError::AlreadyExists(id.to_string()).into());
        }
        blocks.insert(id.to_string(), data.to_vec());
        Ok(())
    }

    async fn update_block(&self, id: &str, data: &[u8]) -> Result<(), ApiError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(ApiError::unreachable(&self.id, "connection reset"));
        }
        self.blocks.lock().insert(id.to_string(), data.to_vec());
        Ok(())
    }

    async fn get_block(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        self.block(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()).into())
    }

    async fn cancel(&self, contract: &Contract) -> Result<(), ApiError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.blocks.lock().remove(&contract.block_id);
        Ok(())
    }
}

/// Dials providers by address; addresses marked offline are unreachable.
#[derive(Default)]
pub struct MemoryDialer {
    providers: Mutex<HashMap<String, Arc<MemoryProvider>>>,
    offline: Mutex<HashSet<String>>,
}

impl MemoryDialer {
    pub fn addr_of(id: &str) -> String {
        format!("mem-{}:8002", id)
    }

    pub fn add(&self, provider: Arc<MemoryProvider>) {
        self.providers
            .lock()
            .insert(Self::addr_of(&provider.id), provider);
    }

    pub fn set_offline(&self, id: &str, offline: bool) {
        let addr = Self::addr_of(id);
        let mut set = self.offline.lock();
        if offline {
            set.insert(addr);
        } else {
            set.remove(&addr);
        }
    }
}

#[async_trait]
impl Dialer for MemoryDialer {
    async fn dial(&self, peer: &PeerInfo) -> Result<Arc<dyn ProviderLink>, ApiError> {
        if self.offline.lock().contains(&peer.addr) {
            return Err(ApiError::unreachable(&peer.addr, "connection refused"));
        }
        match self.providers.lock().get(&peer.addr) {
            Some(provider) => Ok(provider.clone() as Arc<dyn ProviderLink>),
            None => Err(ApiError::unreachable(&peer.addr, "no route to host")),
        }
    }
}

pub struct TestRepo {
    pub temp: TempDir,
    pub repo: Repo,
    pub dialer: Arc<MemoryDialer>,
}

impl TestRepo {
    /// Write `contents` to a scratch file and return its path.
    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let dir = self.temp.path().join("src");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub async fn fetch(&self, name: &str) -> Result<Vec<u8>, ApiError> {
        let mut out = Vec::new();
        self.repo.get(name, &mut out).await?;
        Ok(out)
    }
}

/// Repo for `USER` whose provider table lists `providers` in order.
pub fn repo_with(providers: &[Arc<MemoryProvider>], block_size: usize) -> TestRepo {
    let temp = TempDir::new().unwrap();
    let paths = RepoPaths::new(&temp.path().join("home"));
    paths.create_dirs().unwrap();

    let table: Vec<PeerInfo> = providers
        .iter()
        .map(|p| PeerInfo::new(p.id.clone(), MemoryDialer::addr_of(&p.id)))
        .collect();
    std::fs::write(&paths.providers_file, serde_json::to_vec(&table).unwrap()).unwrap();

    let dialer = Arc::new(MemoryDialer::default());
    for provider in providers {
        dialer.add(provider.clone());
    }

    let mut config = RepoConfig::new(USER, "node-a");
    config.block_size = block_size;
    let repo = Repo::open_with(paths, config, dialer.clone()).unwrap();
    TestRepo { temp, repo, dialer }
}

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
