//! Renter-side cache of metadata objects (`user/<blockId>` JSON files).

use super::{validate_id, write_atomic};
use crate::error::ApiError;
use crate::model::{DirBlock, INodeBlock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MetadataCache {
    dir: PathBuf,
}

impl MetadataCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, ApiError> {
        validate_id(id)?;
        Ok(self.dir.join(id))
    }

    fn load<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, ApiError> {
        let path = self.path_for(id)?;
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save<T: Serialize>(&self, id: &str, value: &T) -> Result<(), ApiError> {
        let path = self.path_for(id)?;
        let bytes = serde_json::to_vec_pretty(value)?;
        std::fs::create_dir_all(&self.dir)?;
        write_atomic(&path, &bytes)?;
        Ok(())
    }

    pub fn load_inode(&self, id: &str) -> Result<Option<INodeBlock>, ApiError> {
        self.load(id)
    }

    pub fn save_inode(&self, inode: &INodeBlock) -> Result<(), ApiError> {
        self.save(&inode.id, inode)
    }

    pub fn load_dir(&self, id: &str) -> Result<Option<DirBlock>, ApiError> {
        self.load(id)
    }

    pub fn save_dir(&self, dir: &DirBlock) -> Result<(), ApiError> {
        self.save(&dir.id, dir)
    }
}
