//! Error types shared across the crate.

use crate::types::{BlockId, ProviderId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a local block store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("block {0} already stored")]
    AlreadyExists(BlockId),

    #[error("no block with id {0}")]
    NotFound(BlockId),

    #[error("invalid block id: {0:?}")]
    InvalidId(String),

    #[error("block store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by repo operations and provider links.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("block {block_id} of {size} bytes exceeds provider limit of {max} bytes")]
    CapacityExceeded {
        block_id: BlockId,
        size: u64,
        max: u64,
    },

    #[error("provider {provider_id} did not accept the contract terms")]
    NegotiationRejected { provider_id: ProviderId },

    #[error("contract for block {block_id} does not carry this provider's seal")]
    InvalidSeal { block_id: BlockId },

    #[error("cannot find a provider for block {block_id}")]
    NoProviderAvailable { block_id: BlockId },

    #[error("provider {provider} unreachable: {reason}")]
    ProviderUnreachable { provider: String, reason: String },

    #[error("provider not found: {0}")]
    ProviderNotFound(ProviderId),

    #[error("malformed response from provider {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },

    #[error("cannot find record of file {0}")]
    FileNotFound(String),

    #[error("failed to download block {0} from any provider")]
    BlockUnavailable(BlockId),

    #[error("metadata pushed to {updated} of {total} providers, {required} required")]
    QuorumNotReached {
        updated: usize,
        required: usize,
        total: usize,
    },

    #[error("directories not supported: {}", .0.display())]
    DirectoryNotSupported(PathBuf),

    #[error("file changed while it was being stored: {}", .0.display())]
    SourceChanged(PathBuf),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    pub fn unreachable(provider: impl Into<String>, reason: impl ToString) -> Self {
        ApiError::ProviderUnreachable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the error reports a block the provider already holds.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ApiError::Storage(StorageError::AlreadyExists(_)))
    }
}
