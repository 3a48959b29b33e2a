//! Disk-backed block store for blocks held on behalf of peers.

use super::{validate_id, write_atomic, BlockStore};
use crate::error::StorageError;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Directory under the store root holding replaceable metadata objects.
/// Block ids never start with a dot, so it cannot collide with a block.
const META_DIR: &str = ".meta";

/// One file per block under a single directory, named by block id.
///
/// Immutable blocks live in the root directory and replaceable metadata in
/// [`META_DIR`]. An id belongs to whichever namespace first claimed it.
#[derive(Debug, Clone)]
pub struct DiskBlockStore {
    dir: PathBuf,
}

impl DiskBlockStore {
    /// Open the store, creating the directories if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(dir.join(META_DIR))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StorageError> {
        validate_id(id)?;
        Ok(self.dir.join(id))
    }

    fn meta_path_for(&self, id: &str) -> Result<PathBuf, StorageError> {
        validate_id(id)?;
        Ok(self.dir.join(META_DIR).join(id))
    }
}

fn remove_if_present(path: &Path) -> Result<bool, StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl BlockStore for DiskBlockStore {
    fn store_block(&self, id: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(id)?;
        if self.meta_path_for(id)?.is_file() {
            return Err(StorageError::AlreadyExists(id.to_string()));
        }

        // create_new is the only synchronisation between concurrent writers
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = file.write_all(data).and_then(|_| file.sync_all()) {
            drop(file);
            let _ = std::fs::remove_file(&path);
            return Err(e.into());
        }

        tracing::debug!(block_id = id, size = data.len(), "stored block");
        Ok(())
    }

    fn replace_block(&self, id: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.path_for(id)?.is_file() {
            return Err(StorageError::AlreadyExists(id.to_string()));
        }
        let path = self.meta_path_for(id)?;
        write_atomic(&path, data)?;
        tracing::debug!(block_id = id, size = data.len(), "replaced block");
        Ok(())
    }

    fn get_block(&self, id: &str) -> Result<Vec<u8>, StorageError> {
        for path in [self.path_for(id)?, self.meta_path_for(id)?] {
            match std::fs::read(&path) {
                Ok(data) => return Ok(data),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::NotFound(id.to_string()))
    }

    fn has_block(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.path_for(id)?.is_file() || self.meta_path_for(id)?.is_file())
    }

    fn remove_block(&self, id: &str) -> Result<bool, StorageError> {
        let block = remove_if_present(&self.path_for(id)?)?;
        let meta = remove_if_present(&self.meta_path_for(id)?)?;
        Ok(block || meta)
    }
}
