use crate::support::{MemoryDialer, MemoryProvider};
use blockrent::chunker::BlockInfo;
use blockrent::error::{ApiError, StorageError};
use blockrent::model::{PeerInfo, ProviderInfo};
use blockrent::negotiation::{ContractNegotiator, ReplicaTarget};
use blockrent::provider::{ConnectedProvider, LocalProvider, ProviderLink};
use std::sync::Arc;

fn connected(provider: &Arc<MemoryProvider>) -> ConnectedProvider {
    ConnectedProvider {
        peer: PeerInfo::new(provider.id.clone(), MemoryDialer::addr_of(&provider.id)),
        link: provider.clone(),
    }
}

#[tokio::test]
async fn first_acceptance_wins_after_rejection() {
    let providers = [
        MemoryProvider::rejecting("p1"),
        MemoryProvider::new("p2"),
        MemoryProvider::new("p3"),
    ];
    let candidates: Vec<_> = providers.iter().map(connected).collect();
    let negotiator = ContractNegotiator::new("alice", None);

    let accepted = negotiator
        .negotiate_many(&BlockInfo::new("b1", 10), &candidates, ReplicaTarget::Count(1))
        .await
        .unwrap();

    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].provider.peer.id, "p2");
    assert_eq!(accepted[0].contract.provider_id, "p2");
    assert!(accepted[0].contract.is_accepted());
    assert!(!accepted[0].contract.renter_signature.is_empty());
}

#[tokio::test]
async fn all_target_collects_every_acceptance() {
    let providers = [
        MemoryProvider::new("p1"),
        MemoryProvider::rejecting("p2"),
        MemoryProvider::new("p3"),
    ];
    let candidates: Vec<_> = providers.iter().map(connected).collect();
    let negotiator = ContractNegotiator::new("alice", None);

    let accepted = negotiator
        .negotiate_many(&BlockInfo::new("b1", 10), &candidates, ReplicaTarget::All)
        .await
        .unwrap();

    let ids: Vec<_> = accepted.iter().map(|a| a.provider.peer.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p3"]);
}

#[tokio::test]
async fn oversized_block_is_declined_by_local_provider() {
    let temp = tempfile::tempdir().unwrap();
    let provider: Arc<dyn ProviderLink> = Arc::new(
        LocalProvider::open(
            ProviderInfo {
                id: "small".to_string(),
                max_block_size: 8,
            },
            30,
            temp.path().join("peer"),
        )
        .unwrap(),
    );
    let negotiator = ContractNegotiator::new("alice", None);

    let result = negotiator
        .negotiate_one(&BlockInfo::new("b1", 9), provider.as_ref())
        .await;
    assert!(matches!(result, Err(ApiError::CapacityExceeded { size: 9, max: 8, .. })));

    let contract = negotiator
        .negotiate_one(&BlockInfo::new("b1", 8), provider.as_ref())
        .await
        .unwrap();
    assert_eq!(contract.provider_id, "small");
    assert!(contract.end_date.is_some());
}

#[tokio::test]
async fn stored_blocks_are_immutable() {
    let temp = tempfile::tempdir().unwrap();
    let provider = LocalProvider::open(
        ProviderInfo {
            id: "p".to_string(),
            max_block_size: 1024,
        },
        30,
        temp.path().join("peer"),
    )
    .unwrap();

    provider.store_block("block-1", b"first").await.unwrap();
    let second = provider.store_block("block-1", b"second").await;

    assert!(matches!(
        second,
        Err(ApiError::Storage(StorageError::AlreadyExists(_)))
    ));
    assert_eq!(provider.get_block("block-1").await.unwrap(), b"first");
}
