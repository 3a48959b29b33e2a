//! Storage contracts between a renter and a provider.

use crate::types::{BlockId, ProviderId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agreed storage terms for one block.
///
/// A contract is accepted iff `provider_signature` is non-empty, and is never
/// modified after acceptance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub block_id: BlockId,
    pub block_size: u64,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub renter_id: UserId,
    pub provider_id: ProviderId,
    #[serde(default)]
    pub renter_signature: String,
    #[serde(default)]
    pub provider_signature: String,
}

impl Contract {
    /// Build an unsigned proposal.
    pub fn proposal(
        block_id: impl Into<BlockId>,
        block_size: u64,
        renter_id: impl Into<UserId>,
        provider_id: impl Into<ProviderId>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            block_size,
            end_date,
            renter_id: renter_id.into(),
            provider_id: provider_id.into(),
            renter_signature: String::new(),
            provider_signature: String::new(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        !self.provider_signature.is_empty()
    }

    /// Seal the contract terms on behalf of `party_id`.
    ///
    /// Identity keys live outside this crate, so the seal is a blake3 digest
    /// over the party and the terms rather than a public-key signature. Any
    /// change to the terms changes the seal.
    pub fn sign_terms(&self, party_id: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        let fields = [
            party_id,
            self.block_id.as_str(),
            self.renter_id.as_str(),
            self.provider_id.as_str(),
        ];
        for field in fields {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        hasher.update(&self.block_size.to_le_bytes());
        match &self.end_date {
            Some(date) => hasher.update(&date.timestamp_millis().to_le_bytes()),
            None => hasher.update(&[0u8]),
        };
        hex::encode(hasher.finalize().as_bytes())
    }

    /// True when `other` describes the same block and size as `self`.
    pub fn covers_same_block(&self, other: &Contract) -> bool {
        self.block_id == other.block_id && self.block_size == other.block_size
    }
}
