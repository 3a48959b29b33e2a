//! Contracts a provider has signed, counted per block.
//!
//! Blocks are content-addressed, so several renters (or several files of one
//! renter) can hold contracts on the same bytes. The bytes are only dropped
//! when the last of those contracts is released.

use crate::error::ApiError;
use crate::store::write_atomic;
use crate::types::BlockId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Outcome of releasing one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// No contract with that seal is on record for the block
    Unknown,
    /// Other contracts still reference the block
    Shared(usize),
    /// The released contract was the last one
    Last { removed: bool },
}

#[derive(Debug, Default)]
pub struct ContractLedger {
    path: Option<PathBuf>,
    seals: Mutex<HashMap<BlockId, Vec<String>>>,
}

impl ContractLedger {
    /// Ledger that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Ledger persisted as JSON at `path`, loaded if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let path = path.into();
        let seals = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            seals: Mutex::new(seals),
        })
    }

    pub fn record(&self, block_id: &str, seal: &str) -> Result<(), ApiError> {
        let mut seals = self.seals.lock();
        seals
            .entry(block_id.to_string())
            .or_default()
            .push(seal.to_string());
        self.persist(&seals)
    }

    /// Number of open contracts on `block_id`.
    pub fn contracts_for(&self, block_id: &str) -> usize {
        self.seals.lock().get(block_id).map_or(0, Vec::len)
    }

    /// Release the contract sealed with `seal`.
    ///
    /// `drop_bytes` runs under the ledger lock when the last contract on the
    /// block goes, so no new contract can be recorded in between. If it fails
    /// the contract stays on record.
    pub fn release<F>(&self, block_id: &str, seal: &str, drop_bytes: F) -> Result<Release, ApiError>
    where
        F: FnOnce() -> Result<bool, ApiError>,
    {
        let mut seals = self.seals.lock();
        let Some(held) = seals.get_mut(block_id) else {
            return Ok(Release::Unknown);
        };
        let Some(pos) = held.iter().position(|s| s == seal) else {
            return Ok(Release::Unknown);
        };

        let release = if held.len() == 1 {
            let removed = drop_bytes()?;
            seals.remove(block_id);
            Release::Last { removed }
        } else {
            held.remove(pos);
            Release::Shared(held.len())
        };
        self.persist(&seals)?;
        Ok(release)
    }

    fn persist(&self, seals: &HashMap<BlockId, Vec<String>>) -> Result<(), ApiError> {
        if let Some(path) = &self.path {
            write_atomic(path, &serde_json::to_vec(seals)?)?;
        }
        Ok(())
    }
}
