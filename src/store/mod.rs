//! Local persistence
//!
//! Two on-disk stores live in a repo home: the provider-side block store
//! (`peer/`) holding raw bytes for remote renters, and the renter-side
//! metadata cache (`user/`) holding JSON inodes and the root listing.

pub mod disk;
pub mod metadata;

pub use disk::DiskBlockStore;
pub use metadata::MetadataCache;

use crate::error::StorageError;
use std::io::Write;
use std::path::Path;

/// Block store interface used by the provider side.
///
/// Blocks are immutable: `store_block` never overwrites. `replace_block` is
/// reserved for metadata objects whose identifier is stable while their
/// content changes, and refuses ids already taken by `store_block` (and the
/// other way round).
pub trait BlockStore: Send + Sync {
    fn store_block(&self, id: &str, data: &[u8]) -> Result<(), StorageError>;
    fn replace_block(&self, id: &str, data: &[u8]) -> Result<(), StorageError>;
    fn get_block(&self, id: &str) -> Result<Vec<u8>, StorageError>;
    fn has_block(&self, id: &str) -> Result<bool, StorageError>;
    /// Returns whether a block was removed.
    fn remove_block(&self, id: &str) -> Result<bool, StorageError>;
}

/// Reject identifiers that are not a single plain path segment.
pub(crate) fn validate_id(id: &str) -> Result<(), StorageError> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && !id.starts_with('.')
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidId(id.to_string()))
    }
}

/// Write `data` to `path` through a temporary file in the same directory so
/// readers never observe a partial file.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
