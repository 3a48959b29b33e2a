//! File and directory metadata objects.
//!
//! Both kinds are stored under contracts exactly like data blocks, and are
//! also cached as JSON in the repo's `user/` directory.

use crate::addressing::{meta_id, root_id, ROOT_NAME};
use crate::model::Contract;
use crate::types::{BlockId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pointer from a file's metadata to one stored data block.
///
/// An empty contract list means storage was never negotiated for the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRef {
    pub id: BlockId,
    #[serde(default)]
    pub contracts: Vec<Contract>,
}

/// Entry of the root listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedBlockRef {
    pub id: BlockId,
    pub name: String,
}

/// Storage parameters a file was written with.
///
/// `encryption_type` is recorded only; no cipher is applied to block data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePolicy {
    pub block_size: usize,
    pub redundancy: usize,
    pub encryption_type: String,
}

/// Options for a single `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOptions {
    /// Display name in the root listing
    pub file_name: String,
    pub policy: StoragePolicy,
}

/// Full description of one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct INodeBlock {
    pub id: BlockId,
    pub name: String,
    pub owner_id: UserId,
    #[serde(default)]
    pub access_list: Vec<UserId>,
    #[serde(default)]
    pub encryption_keys: Vec<String>,
    /// Data blocks in file order
    #[serde(default)]
    pub blocks: Vec<BlockRef>,
    pub size: u64,
    /// Contracts covering this metadata object itself
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<StoragePolicy>,
}

impl INodeBlock {
    pub fn new(owner_id: &str, name: &str, size: u64, policy: StoragePolicy) -> Self {
        Self {
            id: meta_id(owner_id, name),
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            access_list: Vec::new(),
            encryption_keys: Vec::new(),
            blocks: Vec::new(),
            size,
            contracts: Vec::new(),
            policy: Some(policy),
        }
    }
}

/// A user's flat file index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirBlock {
    pub id: BlockId,
    pub name: String,
    pub owner_id: UserId,
    #[serde(default)]
    pub files: Vec<NamedBlockRef>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl DirBlock {
    /// Empty root listing for `owner_id`.
    pub fn new_root(owner_id: &str) -> Self {
        Self {
            id: root_id(owner_id),
            name: ROOT_NAME.to_string(),
            owner_id: owner_id.to_string(),
            files: Vec::new(),
            contracts: Vec::new(),
            last_modified: Some(Utc::now()),
        }
    }

    pub fn contains_file(&self, name: &str) -> bool {
        self.files.iter().any(|entry| entry.name == name)
    }

    /// `name` itself if unused, otherwise the first free `"name (n)"`.
    pub fn unique_name(&self, name: &str) -> String {
        if !self.contains_file(name) {
            return name.to_string();
        }
        (1..)
            .map(|n| format!("{} ({})", name, n))
            .find(|candidate| !self.contains_file(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    pub fn add_file(&mut self, id: BlockId, name: String) {
        self.files.push(NamedBlockRef { id, name });
        self.last_modified = Some(Utc::now());
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|entry| entry.name.clone()).collect()
    }
}
