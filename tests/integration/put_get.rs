use crate::support::{pattern, repo_with, MemoryProvider, USER};
use blockrent::addressing::{content_id, meta_id};
use blockrent::error::ApiError;
use blockrent::model::{StorageOptions, StoragePolicy};

const BLOCK: usize = 16;

#[tokio::test]
async fn put_then_get_reproduces_bytes() {
    let provider = MemoryProvider::new("p1");
    let mut t = repo_with(&[provider.clone()], BLOCK);

    for size in [0, 1, BLOCK - 1, BLOCK, BLOCK + 1, 3 * BLOCK] {
        let name = format!("file-{}.bin", size);
        let data = pattern(size);
        let path = t.write_file(&name, &data);

        let inode = t.repo.put(&path, None).await.unwrap();
        assert_eq!(inode.name, name);
        assert_eq!(inode.size, size as u64);
        assert_eq!(inode.blocks.len(), size.div_ceil(BLOCK));

        assert_eq!(t.fetch(&name).await.unwrap(), data, "size {}", size);
    }
}

#[tokio::test]
async fn put_records_inode_and_listing() {
    let provider = MemoryProvider::new("p1");
    let mut t = repo_with(&[provider.clone()], BLOCK);
    let path = t.write_file("notes.txt", &pattern(40));

    let inode = t.repo.put(&path, None).await.unwrap();

    assert_eq!(inode.id, meta_id(USER, "notes.txt"));
    assert_eq!(inode.contracts.len(), 1);
    assert!(inode.contracts[0].is_accepted());
    for block in &inode.blocks {
        assert_eq!(block.contracts.len(), 1);
        assert_eq!(block.contracts[0].provider_id, "p1");
        assert!(provider.holds(&block.id));
    }
    // the provider holds the serialized inode under its metadata id
    let stored = provider.block(&inode.id).unwrap();
    let remote: blockrent::model::INodeBlock = serde_json::from_slice(&stored).unwrap();
    assert_eq!(remote.blocks, inode.blocks);

    assert_eq!(t.repo.list_files(), vec!["notes.txt".to_string()]);
    assert!(t.repo.paths().user_dir.join(&inode.id).is_file());
}

#[tokio::test]
async fn same_name_gets_numbered_suffix() {
    let provider = MemoryProvider::new("p1");
    let mut t = repo_with(&[provider], BLOCK);
    let first = t.write_file("name", b"first version");
    t.repo.put(&first, None).await.unwrap();
    let second = t.write_file("name", b"second version");
    t.repo.put(&second, None).await.unwrap();

    assert_eq!(
        t.repo.list_files(),
        vec!["name".to_string(), "name (1)".to_string()]
    );
    assert_eq!(t.fetch("name").await.unwrap(), b"first version");
    assert_eq!(t.fetch("name (1)").await.unwrap(), b"second version");
}

#[tokio::test]
async fn repeated_content_is_stored_once() {
    let provider = MemoryProvider::new("p1");
    let mut t = repo_with(&[provider.clone()], BLOCK);
    let data = [vec![7u8; BLOCK], vec![7u8; BLOCK]].concat();
    let path = t.write_file("twice.bin", &data);

    let inode = t.repo.put(&path, None).await.unwrap();

    assert_eq!(inode.blocks[0].id, inode.blocks[1].id);
    // one data block plus the inode
    assert_eq!(provider.block_count(), 2);
    assert_eq!(t.fetch("twice.bin").await.unwrap(), data);
}

#[tokio::test]
async fn redundancy_places_each_block_on_several_providers() {
    let providers = [
        MemoryProvider::new("p1"),
        MemoryProvider::new("p2"),
        MemoryProvider::new("p3"),
    ];
    let mut t = repo_with(&providers, BLOCK);
    let path = t.write_file("r.bin", &pattern(3 * BLOCK));
    let options = StorageOptions {
        file_name: "r.bin".to_string(),
        policy: StoragePolicy {
            block_size: BLOCK,
            redundancy: 2,
            encryption_type: "aes".to_string(),
        },
    };

    let inode = t.repo.put(&path, Some(options)).await.unwrap();

    for block in &inode.blocks {
        let holders: Vec<&str> = block
            .contracts
            .iter()
            .map(|c| c.provider_id.as_str())
            .collect();
        assert_eq!(holders, vec!["p1", "p2"]);
        assert!(!providers[2].holds(&block.id));
    }
}

#[tokio::test]
async fn get_falls_back_when_first_provider_unreachable() {
    let providers = [MemoryProvider::new("p1"), MemoryProvider::new("p2")];
    let mut t = repo_with(&providers, BLOCK);
    let data = pattern(2 * BLOCK + 3);
    let path = t.write_file("f.bin", &data);
    let options = StorageOptions {
        file_name: "f.bin".to_string(),
        policy: StoragePolicy {
            block_size: BLOCK,
            redundancy: 2,
            encryption_type: "aes".to_string(),
        },
    };
    t.repo.put(&path, Some(options)).await.unwrap();

    t.dialer.set_offline("p1", true);
    assert_eq!(t.fetch("f.bin").await.unwrap(), data);
}

#[tokio::test]
async fn get_skips_provider_returning_wrong_bytes() {
    let providers = [MemoryProvider::new("p1"), MemoryProvider::new("p2")];
    let mut t = repo_with(&providers, BLOCK);
    let data = pattern(BLOCK);
    let path = t.write_file("f.bin", &data);
    let mut options = t.repo.config().default_storage_options("f.bin");
    options.policy.redundancy = 2;
    t.repo.put(&path, Some(options)).await.unwrap();

    providers[0].corrupt(&content_id(&data), b"garbage");
    assert_eq!(t.fetch("f.bin").await.unwrap(), data);
}

#[tokio::test]
async fn get_fails_when_no_contract_yields_the_block() {
    let provider = MemoryProvider::new("p1");
    let mut t = repo_with(&[provider], BLOCK);
    let path = t.write_file("f.bin", &pattern(BLOCK * 2));
    t.repo.put(&path, None).await.unwrap();

    t.dialer.set_offline("p1", true);
    let result = t.fetch("f.bin").await;
    assert!(matches!(result, Err(ApiError::BlockUnavailable(_))));
}

#[tokio::test]
async fn get_unknown_name_is_file_not_found() {
    let t = repo_with(&[MemoryProvider::new("p1")], BLOCK);
    assert!(matches!(
        t.fetch("missing").await,
        Err(ApiError::FileNotFound(name)) if name == "missing"
    ));
}

#[tokio::test]
async fn put_rejects_directories() {
    let mut t = repo_with(&[MemoryProvider::new("p1")], BLOCK);
    let dir = t.temp.path().join("a-dir");
    std::fs::create_dir_all(&dir).unwrap();

    assert!(matches!(
        t.repo.put(&dir, None).await,
        Err(ApiError::DirectoryNotSupported(_))
    ));
}

#[tokio::test]
async fn put_without_accepting_provider_fails() {
    let mut t = repo_with(
        &[MemoryProvider::rejecting("p1"), MemoryProvider::rejecting("p2")],
        BLOCK,
    );
    let path = t.write_file("f.bin", &pattern(BLOCK));

    assert!(matches!(
        t.repo.put(&path, None).await,
        Err(ApiError::NoProviderAvailable { .. })
    ));
    assert!(t.repo.list_files().is_empty());
}

#[tokio::test]
async fn failed_put_cancels_blocks_it_wrote() {
    let provider = MemoryProvider::new("p1");
    let mut t = repo_with(&[provider.clone()], BLOCK);
    let data = pattern(3 * BLOCK);
    let path = t.write_file("f.bin", &data);

    // the provider already holds the middle block for some other file
    let held = content_id(&data[BLOCK..2 * BLOCK]);
    provider.corrupt(&held, &data[BLOCK..2 * BLOCK]);
    provider.fail_store_of(&meta_id(USER, "f.bin"));

    let result = t.repo.put(&path, None).await;

    assert!(matches!(result, Err(ApiError::ProviderUnreachable { .. })));
    assert!(t.repo.list_files().is_empty());
    assert!(!provider.holds(&content_id(&data[..BLOCK])));
    assert!(!provider.holds(&content_id(&data[2 * BLOCK..])));
    assert!(provider.holds(&held));
    assert_eq!(provider.cancels(), 2);
}

#[tokio::test]
async fn put_fails_when_file_changes_between_passes() {
    let data = pattern(2 * BLOCK);
    let mut flipped = data.clone();
    flipped[BLOCK] ^= 0xff;

    for changed in [flipped, data[..BLOCK].to_vec(), pattern(3 * BLOCK)] {
        let provider = MemoryProvider::new("p1");
        let mut t = repo_with(&[provider.clone()], BLOCK);
        let path = t.write_file("moving.bin", &data);
        provider.rewrite_on_negotiate(&path, &changed);

        let result = t.repo.put(&path, None).await;

        assert!(matches!(result, Err(ApiError::SourceChanged(ref p)) if *p == path));
        assert!(t.repo.list_files().is_empty());
        // blocks written before the change was noticed are released
        assert!(!provider.holds(&content_id(&data[..BLOCK])));
        assert!(!provider.holds(&meta_id(USER, "moving.bin")));
    }
}
