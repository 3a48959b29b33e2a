//! Repo home resolution and on-disk layout.

use crate::error::ApiError;
use std::path::{Path, PathBuf};

/// Overrides the default repo home.
pub const HOME_ENV: &str = "BLOCKRENT_HOME";

const DEFAULT_DIR_NAME: &str = ".blockrent";

/// Resolve the repo home: explicit path, then `BLOCKRENT_HOME`, then `~/.blockrent`.
pub fn resolve_home(explicit: Option<PathBuf>) -> Result<PathBuf, ApiError> {
    if let Some(p) = explicit {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    if let Ok(env_path) = std::env::var(HOME_ENV) {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    let base = directories::BaseDirs::new().ok_or_else(|| {
        ApiError::ConfigError("Could not determine home directory for repo".to_string())
    })?;
    Ok(base.home_dir().join(DEFAULT_DIR_NAME))
}

/// Files and directories of one repo home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    pub home: PathBuf,
    pub config_file: PathBuf,
    pub providers_file: PathBuf,
    /// Cached metadata objects (`INodeBlock`, `DirBlock`)
    pub user_dir: PathBuf,
    /// Blocks held for other peers
    pub peer_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl RepoPaths {
    pub fn new(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            config_file: home.join("config.json"),
            providers_file: home.join("providers.json"),
            user_dir: home.join("user"),
            peer_dir: home.join("peer"),
            logs_dir: home.join("logs"),
        }
    }

    pub fn default_log_file(&self) -> PathBuf {
        self.logs_dir.join("blockrent.log")
    }

    /// Create the directory layout. Existing directories are left as they are.
    pub fn create_dirs(&self) -> Result<(), ApiError> {
        for dir in [&self.home, &self.user_dir, &self.peer_dir, &self.logs_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
