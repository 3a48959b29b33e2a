//! Storage providers
//!
//! A [`ProviderLink`] is one remote (or local) provider as seen by a renter:
//! query capability, negotiate a contract, move block bytes. The network
//! realisation is [`RemoteProvider`]; [`LocalProvider`] serves this node's own
//! disk store and backs the HTTP server in [`server`].

pub mod ledger;
pub mod local;
pub mod remote;
pub mod server;

pub use ledger::{ContractLedger, Release};
pub use local::{AdmissionPolicy, LocalProvider};
pub use remote::{HttpDialer, RemoteProvider};

use crate::error::ApiError;
use crate::model::{Contract, PeerInfo, ProviderInfo};
use async_trait::async_trait;
use std::sync::Arc;

/// Capability of one storage provider.
#[async_trait]
pub trait ProviderLink: Send + Sync {
    async fn info(&self) -> Result<ProviderInfo, ApiError>;

    /// Propose storage terms.
    ///
    /// If the provider agrees it returns the contract carrying its signature.
    /// Otherwise the signature is left empty and the terms may be adjusted to
    /// the provider's requirements. An error means the provider would not
    /// respond at all.
    async fn negotiate(&self, contract: &Contract) -> Result<Contract, ApiError>;

    /// Store a block. Fails with `AlreadyExists` if the id is taken.
    async fn store_block(&self, id: &str, data: &[u8]) -> Result<(), ApiError>;

    /// Create or replace a metadata object under a stable id.
    async fn update_block(&self, id: &str, data: &[u8]) -> Result<(), ApiError>;

    async fn get_block(&self, id: &str) -> Result<Vec<u8>, ApiError>;

    /// Release a contract. The provider drops the bytes once no other
    /// contract references them, and refuses contracts it never sealed.
    async fn cancel(&self, contract: &Contract) -> Result<(), ApiError>;
}

/// Opens links to known peers.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, peer: &PeerInfo) -> Result<Arc<dyn ProviderLink>, ApiError>;
}

/// A dialed provider together with the table entry it came from.
#[derive(Clone)]
pub struct ConnectedProvider {
    pub peer: PeerInfo,
    pub link: Arc<dyn ProviderLink>,
}

impl std::fmt::Debug for ConnectedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedProvider")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}
