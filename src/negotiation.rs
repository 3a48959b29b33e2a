//! Contract negotiation
//!
//! Runs the renter side of the negotiation protocol for one block against a
//! list of candidate providers. Providers are tried strictly in list order,
//! so the earliest accepting providers win; negotiation stops as soon as the
//! replica target is met.

use crate::chunker::BlockInfo;
use crate::error::ApiError;
use crate::model::Contract;
use crate::provider::{ConnectedProvider, ProviderLink};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// How many accepted contracts to collect for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaTarget {
    /// Stop after this many acceptances (values below 1 count as 1)
    Count(usize),
    /// Ask every candidate
    All,
}

impl ReplicaTarget {
    fn reached(&self, accepted: usize) -> bool {
        match self {
            ReplicaTarget::Count(n) => accepted >= (*n).max(1),
            ReplicaTarget::All => false,
        }
    }
}

/// A signed contract and the provider that signed it.
#[derive(Clone, Debug)]
pub struct AcceptedContract {
    pub provider: ConnectedProvider,
    pub contract: Contract,
}

impl AcceptedContract {
    pub fn link(&self) -> &Arc<dyn ProviderLink> {
        &self.provider.link
    }
}

/// Renter-side negotiator.
#[derive(Debug, Clone)]
pub struct ContractNegotiator {
    renter_id: String,
    end_date: Option<DateTime<Utc>>,
}

impl ContractNegotiator {
    pub fn new(renter_id: impl Into<String>, end_date: Option<DateTime<Utc>>) -> Self {
        Self {
            renter_id: renter_id.into(),
            end_date,
        }
    }

    /// Negotiate storage of `block` with a single provider.
    pub async fn negotiate_one(
        &self,
        block: &BlockInfo,
        provider: &dyn ProviderLink,
    ) -> Result<Contract, ApiError> {
        let info = provider.info().await?;
        if block.size > info.max_block_size {
            return Err(ApiError::CapacityExceeded {
                block_id: block.id.clone(),
                size: block.size,
                max: info.max_block_size,
            });
        }

        let mut proposal = Contract::proposal(
            block.id.clone(),
            block.size,
            self.renter_id.clone(),
            info.id.clone(),
            self.end_date,
        );
        proposal.renter_signature = proposal.sign_terms(&self.renter_id);

        let answer = provider.negotiate(&proposal).await?;
        if !answer.is_accepted() {
            return Err(ApiError::NegotiationRejected {
                provider_id: info.id,
            });
        }
        if !answer.covers_same_block(&proposal) {
            return Err(ApiError::MalformedResponse {
                provider: info.id,
                reason: format!(
                    "signed contract for block {} ({} bytes), proposed {} ({} bytes)",
                    answer.block_id, answer.block_size, proposal.block_id, proposal.block_size
                ),
            });
        }
        Ok(answer)
    }

    /// Negotiate with `providers` in order until `target` acceptances.
    ///
    /// Providers that error or reject are logged and skipped. Fails with
    /// `NoProviderAvailable` only when nobody accepts.
    pub async fn negotiate_many(
        &self,
        block: &BlockInfo,
        providers: &[ConnectedProvider],
        target: ReplicaTarget,
    ) -> Result<Vec<AcceptedContract>, ApiError> {
        let mut accepted = Vec::new();
        for provider in providers {
            match self.negotiate_one(block, provider.link.as_ref()).await {
                Ok(contract) => {
                    tracing::debug!(
                        block_id = %block.id,
                        provider = %provider.peer.id,
                        "contract accepted"
                    );
                    accepted.push(AcceptedContract {
                        provider: provider.clone(),
                        contract,
                    });
                    if target.reached(accepted.len()) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        block_id = %block.id,
                        provider = %provider.peer.id,
                        error = %e,
                        "negotiation failed"
                    );
                }
            }
        }

        if accepted.is_empty() {
            return Err(ApiError::NoProviderAvailable {
                block_id: block.id.clone(),
            });
        }
        if let ReplicaTarget::Count(n) = target {
            if accepted.len() < n {
                tracing::warn!(
                    block_id = %block.id,
                    accepted = accepted.len(),
                    wanted = n,
                    "fewer replicas than requested"
                );
            }
        }
        Ok(accepted)
    }
}
