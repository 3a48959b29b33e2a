//! Replicating the root listing.
//!
//! The first sync negotiates contracts for the root listing with every
//! reachable provider. Later syncs push to the providers already under
//! contract. Either way the push must reach a quorum of the contracts.

use super::{Repo, METADATA_NEGOTIATION_SIZE};
use crate::chunker::BlockInfo;
use crate::error::ApiError;
use crate::negotiation::{AcceptedContract, ReplicaTarget};
use futures::future::join_all;
use serde::Serialize;

/// Outcome of a successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Providers that took the pushed listing
    pub updated: usize,
    /// Contracts on the listing
    pub total: usize,
    /// Whether this round negotiated the contracts
    pub negotiated: bool,
}

/// Push quorum: at least half the contracts (integer division) and at
/// least one push.
///
/// The one-push floor is stricter than `updated >= total / 2` alone: with a
/// single contract whose push fails, `1 / 2 == 0` would count zero pushes as
/// a quorum. Here that sync fails.
pub fn quorum_reached(updated: usize, total: usize) -> bool {
    updated > 0 && updated >= total / 2
}

fn required(total: usize) -> usize {
    (total / 2).max(1)
}

impl Repo {
    pub async fn sync(&mut self) -> Result<SyncReport, ApiError> {
        let negotiated = self.root.contracts.is_empty();
        let targets = if negotiated {
            let providers = self.connect_all().await?;
            let placeholder = BlockInfo::new(self.root.id.clone(), METADATA_NEGOTIATION_SIZE);
            self.negotiator()
                .negotiate_many(&placeholder, &providers, ReplicaTarget::All)
                .await?
        } else {
            self.connect_contracted().await
        };

        let mut root = self.root.clone();
        if negotiated {
            root.contracts = targets.iter().map(|t| t.contract.clone()).collect();
        }
        let total = root.contracts.len();
        let serialized = serde_json::to_vec(&root)?;

        let pushes = targets.iter().map(|target| {
            let serialized = &serialized;
            let root_id = &root.id;
            async move {
                match target.link().update_block(root_id, serialized).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(provider = %target.provider.peer.id, error = %e, "metadata push failed");
                        false
                    }
                }
            }
        });
        let updated = join_all(pushes).await.into_iter().filter(|ok| *ok).count();

        if !quorum_reached(updated, total) {
            if negotiated {
                release(&targets).await;
            }
            return Err(ApiError::QuorumNotReached {
                updated,
                required: required(total),
                total,
            });
        }

        if negotiated {
            self.metadata.save_dir(&root)?;
            self.root = root;
        }
        tracing::info!(updated, total, negotiated, "synced root listing");
        Ok(SyncReport {
            updated,
            total,
            negotiated,
        })
    }

    /// Dial the provider of every existing root contract. Providers that do
    /// not resolve or connect sit this round out; their contracts stay.
    async fn connect_contracted(&self) -> Vec<AcceptedContract> {
        let dials = self.root.contracts.iter().map(|contract| async move {
            match self.connect(&contract.provider_id).await {
                Ok(provider) => Some(AcceptedContract {
                    provider,
                    contract: contract.clone(),
                }),
                Err(e) => {
                    tracing::warn!(provider = %contract.provider_id, error = %e, "provider left out of sync");
                    None
                }
            }
        });
        join_all(dials).await.into_iter().flatten().collect()
    }
}

async fn release(targets: &[AcceptedContract]) {
    let cancels = targets.iter().map(|target| async move {
        if let Err(e) = target.link().cancel(&target.contract).await {
            tracing::warn!(provider = %target.provider.peer.id, error = %e, "failed to cancel contract");
        }
    });
    join_all(cancels).await;
}
