use crate::support::{pattern, repo_with, MemoryProvider, USER};
use blockrent::addressing::root_id;
use blockrent::error::ApiError;
use blockrent::model::DirBlock;
use blockrent::repo::Repo;
use std::sync::Arc;

fn providers(n: usize) -> Vec<Arc<MemoryProvider>> {
    (1..=n).map(|i| MemoryProvider::new(&format!("p{}", i))).collect()
}

#[tokio::test]
async fn first_sync_negotiates_with_every_provider() {
    let providers = providers(3);
    let mut t = repo_with(&providers, 16);

    let report = t.repo.sync().await.unwrap();

    assert!(report.negotiated);
    assert_eq!((report.updated, report.total), (3, 3));
    assert_eq!(t.repo.root().contracts.len(), 3);
    let root = root_id(USER);
    for provider in &providers {
        let listing: DirBlock = serde_json::from_slice(&provider.block(&root).unwrap()).unwrap();
        assert_eq!(listing.contracts.len(), 3);
    }

    // persisted with its contracts
    let paths = t.repo.paths().clone();
    let config = t.repo.config().clone();
    let reopened = Repo::open_with(paths, config, t.dialer.clone()).unwrap();
    assert_eq!(reopened.root().contracts.len(), 3);
}

#[tokio::test]
async fn later_sync_pushes_current_listing_to_contracted_providers() {
    let providers = providers(2);
    let mut t = repo_with(&providers, 16);
    t.repo.sync().await.unwrap();

    let path = t.write_file("a.txt", &pattern(20));
    t.repo.put(&path, None).await.unwrap();
    let report = t.repo.sync().await.unwrap();

    assert!(!report.negotiated);
    assert_eq!(report.updated, 2);
    let listing: DirBlock =
        serde_json::from_slice(&providers[1].block(&root_id(USER)).unwrap()).unwrap();
    assert_eq!(listing.file_names(), vec!["a.txt".to_string()]);
}

#[tokio::test]
async fn quorum_of_half_passes_and_less_fails() {
    let providers = providers(4);
    let mut t = repo_with(&providers, 16);
    t.repo.sync().await.unwrap();

    providers[2].fail_updates(true);
    providers[3].fail_updates(true);
    let report = t.repo.sync().await.unwrap();
    assert_eq!((report.updated, report.total), (2, 4));

    t.dialer.set_offline("p2", true);
    let result = t.repo.sync().await;
    assert!(matches!(
        result,
        Err(ApiError::QuorumNotReached {
            updated: 1,
            required: 2,
            total: 4
        })
    ));
    // contracts of unreachable providers are kept
    assert_eq!(t.repo.root().contracts.len(), 4);
}

#[tokio::test]
async fn failed_first_sync_releases_new_contracts() {
    let providers = providers(2);
    for provider in &providers {
        provider.fail_updates(true);
    }
    let mut t = repo_with(&providers, 16);

    let result = t.repo.sync().await;

    assert!(matches!(result, Err(ApiError::QuorumNotReached { updated: 0, .. })));
    assert!(t.repo.root().contracts.is_empty());
    assert!(providers.iter().all(|p| p.cancels() == 1));
}

#[tokio::test]
async fn sync_without_providers_fails() {
    let mut t = repo_with(&[], 16);
    assert!(matches!(
        t.repo.sync().await,
        Err(ApiError::NoProviderAvailable { .. })
    ));
}
