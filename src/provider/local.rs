//! Provider backed by this node's own block store.

use super::ledger::{ContractLedger, Release};
use super::ProviderLink;
use crate::error::ApiError;
use crate::model::{Contract, ProviderInfo};
use crate::store::{BlockStore, DiskBlockStore};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Ledger file inside the store directory. Block ids cannot start with a
/// dot, so it never shadows a block.
const LEDGER_FILE: &str = ".contracts.json";

/// Which contracts this provider signs.
///
/// A proposal is accepted when its block fits within `max_block_size`;
/// larger proposals come back unsigned with the size capped at the limit,
/// which the renter reads as a rejection.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    pub max_block_size: u64,
    pub contract_days: i64,
}

impl AdmissionPolicy {
    pub fn admits(&self, contract: &Contract) -> bool {
        contract.block_size <= self.max_block_size
    }
}

pub struct LocalProvider {
    info: ProviderInfo,
    policy: AdmissionPolicy,
    store: Arc<dyn BlockStore>,
    ledger: Arc<ContractLedger>,
}

impl LocalProvider {
    /// Provider over `store` with an in-memory contract ledger.
    pub fn new(info: ProviderInfo, contract_days: i64, store: Arc<dyn BlockStore>) -> Self {
        Self::with_ledger(info, contract_days, store, ContractLedger::in_memory())
    }

    pub fn with_ledger(
        info: ProviderInfo,
        contract_days: i64,
        store: Arc<dyn BlockStore>,
        ledger: ContractLedger,
    ) -> Self {
        let policy = AdmissionPolicy {
            max_block_size: info.max_block_size,
            contract_days,
        };
        Self {
            info,
            policy,
            store,
            ledger: Arc::new(ledger),
        }
    }

    /// Provider over a disk store rooted at `dir`, with its ledger kept in
    /// the same directory.
    pub fn open(
        info: ProviderInfo,
        contract_days: i64,
        dir: impl Into<std::path::PathBuf>,
    ) -> Result<Self, ApiError> {
        let store = DiskBlockStore::open(dir)?;
        let ledger = ContractLedger::open(store.dir().join(LEDGER_FILE))?;
        Ok(Self::with_ledger(info, contract_days, Arc::new(store), ledger))
    }

    pub fn provider_info(&self) -> &ProviderInfo {
        &self.info
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    pub fn ledger(&self) -> &ContractLedger {
        &self.ledger
    }

    fn sign(&self, proposal: &Contract) -> Contract {
        let mut contract = proposal.clone();
        contract.provider_id = self.info.id.clone();
        if contract.end_date.is_none() {
            contract.end_date = Some(Utc::now() + Duration::days(self.policy.contract_days));
        }
        contract.provider_signature = contract.sign_terms(&self.info.id);
        contract
    }

    fn sealed_here(&self, contract: &Contract) -> bool {
        contract.provider_id == self.info.id
            && contract.is_accepted()
            && contract.provider_signature == contract.sign_terms(&self.info.id)
    }
}

/// Run store I/O on the blocking pool so large bodies do not stall the
/// async workers.
async fn blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Io(std::io::Error::other(e)))?
}

#[async_trait]
impl ProviderLink for LocalProvider {
    async fn info(&self) -> Result<ProviderInfo, ApiError> {
        Ok(self.info.clone())
    }

    async fn negotiate(&self, contract: &Contract) -> Result<Contract, ApiError> {
        if self.policy.admits(contract) {
            let signed = self.sign(contract);
            let ledger = self.ledger.clone();
            let (block_id, seal) = (signed.block_id.clone(), signed.provider_signature.clone());
            blocking(move || ledger.record(&block_id, &seal)).await?;
            tracing::info!(
                block_id = %contract.block_id,
                renter = %contract.renter_id,
                "signed storage contract"
            );
            return Ok(signed);
        }

        tracing::info!(
            block_id = %contract.block_id,
            size = contract.block_size,
            max = self.policy.max_block_size,
            "declined storage contract"
        );
        let mut counter = contract.clone();
        counter.provider_id = self.info.id.clone();
        counter.block_size = self.policy.max_block_size;
        counter.provider_signature.clear();
        Ok(counter)
    }

    async fn store_block(&self, id: &str, data: &[u8]) -> Result<(), ApiError> {
        let (store, id, data) = (self.store.clone(), id.to_string(), data.to_vec());
        blocking(move || Ok(store.store_block(&id, &data)?)).await
    }

    async fn update_block(&self, id: &str, data: &[u8]) -> Result<(), ApiError> {
        let (store, id, data) = (self.store.clone(), id.to_string(), data.to_vec());
        blocking(move || Ok(store.replace_block(&id, &data)?)).await
    }

    async fn get_block(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        let (store, id) = (self.store.clone(), id.to_string());
        blocking(move || Ok(store.get_block(&id)?)).await
    }

    async fn cancel(&self, contract: &Contract) -> Result<(), ApiError> {
        if !self.sealed_here(contract) {
            tracing::warn!(
                block_id = %contract.block_id,
                renter = %contract.renter_id,
                "refused cancel of a contract not sealed here"
            );
            return Err(ApiError::InvalidSeal {
                block_id: contract.block_id.clone(),
            });
        }

        let (store, ledger) = (self.store.clone(), self.ledger.clone());
        let (block_id, seal) = (contract.block_id.clone(), contract.provider_signature.clone());
        let release = blocking(move || {
            ledger.release(&block_id, &seal, || Ok(store.remove_block(&block_id)?))
        })
        .await?;
        if release == Release::Unknown {
            tracing::debug!(block_id = %contract.block_id, "cancel of a released contract");
        } else {
            tracing::info!(block_id = %contract.block_id, ?release, "contract cancelled");
        }
        Ok(())
    }
}
