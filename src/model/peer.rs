use crate::types::ProviderId;
use serde::{Deserialize, Serialize};

/// A known provider's network identity, as listed in `providers.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: ProviderId,
    pub addr: String,
}

impl PeerInfo {
    pub fn new(id: impl Into<ProviderId>, addr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            addr: addr.into(),
        }
    }
}

/// Capability advertisement returned by a provider's `info` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub max_block_size: u64,
}
