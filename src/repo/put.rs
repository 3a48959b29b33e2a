//! Replicating a local file onto providers.

use super::saga::PutSaga;
use super::{display_name, Repo, METADATA_NEGOTIATION_SIZE};
use crate::addressing::content_id;
use crate::chunker::{block_infos, BlockInfo, Blocks};
use crate::error::ApiError;
use crate::model::{BlockRef, Contract, INodeBlock, StorageOptions};
use crate::negotiation::{AcceptedContract, ReplicaTarget};
use futures::future::join_all;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

impl Repo {
    /// Store the file at `path` and add it to the root listing.
    ///
    /// Without `options` the configured block size and redundancy apply and
    /// the display name is the file name. A name already in the listing gets
    /// a `" (n)"` suffix. If any step fails, contracts whose bytes this call
    /// wrote are cancelled before the error is returned.
    pub async fn put(
        &mut self,
        path: &Path,
        options: Option<StorageOptions>,
    ) -> Result<INodeBlock, ApiError> {
        if std::fs::metadata(path)?.is_dir() {
            return Err(ApiError::DirectoryNotSupported(path.to_path_buf()));
        }
        let options = match options {
            Some(options) => options,
            None => self.config.default_storage_options(&display_name(path)),
        };
        let name = self.root.unique_name(&options.file_name);

        let mut saga = PutSaga::default();
        let inode = match self.replicate(path, &name, &options, &mut saga).await {
            Ok(inode) => inode,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "put failed");
                saga.unwind().await;
                return Err(e);
            }
        };
        if let Err(e) = self.commit(&inode) {
            saga.unwind().await;
            return Err(e);
        }

        tracing::info!(
            name = %inode.name,
            id = %inode.id,
            blocks = inode.blocks.len(),
            size = inode.size,
            "stored file"
        );
        Ok(inode)
    }

    async fn replicate(
        &self,
        path: &Path,
        name: &str,
        options: &StorageOptions,
        saga: &mut PutSaga,
    ) -> Result<INodeBlock, ApiError> {
        let block_size = options.policy.block_size;
        let infos = block_infos(&mut BufReader::new(File::open(path)?), block_size)?;
        let size = infos.iter().map(|block| block.size).sum();

        let providers = self.connect_all().await?;
        let negotiator = self.negotiator();
        let target = ReplicaTarget::Count(options.policy.redundancy);

        let mut placements = Vec::with_capacity(infos.len());
        for block in &infos {
            let accepted = negotiator.negotiate_many(block, &providers, target).await?;
            saga.accepted(&accepted);
            placements.push(accepted);
        }

        let mut inode = INodeBlock::new(&self.config.user_id, name, size, options.policy.clone());
        let placeholder = BlockInfo::new(inode.id.clone(), METADATA_NEGOTIATION_SIZE);
        let meta_accepted = negotiator
            .negotiate_many(&placeholder, &providers, target)
            .await?;
        saga.accepted(&meta_accepted);

        let mut blocks = Blocks::new(BufReader::new(File::open(path)?), block_size)?;
        for (info, accepted) in infos.iter().zip(&placements) {
            let data = match blocks.next() {
                Some(data) => data?,
                None => return Err(ApiError::SourceChanged(path.to_path_buf())),
            };
            if content_id(&data) != info.id {
                return Err(ApiError::SourceChanged(path.to_path_buf()));
            }
            let contracts = upload(&info.id, &data, accepted, saga, true).await?;
            inode.blocks.push(BlockRef {
                id: info.id.clone(),
                contracts,
            });
        }
        if blocks.next().is_some() {
            return Err(ApiError::SourceChanged(path.to_path_buf()));
        }

        inode.contracts = meta_accepted.iter().map(|a| a.contract.clone()).collect();
        let serialized = serde_json::to_vec(&inode)?;
        upload(&inode.id, &serialized, &meta_accepted, saga, false).await?;
        Ok(inode)
    }

    fn commit(&mut self, inode: &INodeBlock) -> Result<(), ApiError> {
        self.metadata.save_inode(inode)?;
        let mut root = self.root.clone();
        root.add_file(inode.id.clone(), inode.name.clone());
        self.metadata.save_dir(&root)?;
        self.root = root;
        Ok(())
    }
}

/// Write `data` to every accepting provider at once.
///
/// Returns the contracts whose provider now holds the bytes. With
/// `content_addressed`, a provider answering `AlreadyExists` holds identical
/// bytes and counts as stored. Fails only if no provider stored it.
async fn upload(
    id: &str,
    data: &[u8],
    accepted: &[AcceptedContract],
    saga: &mut PutSaga,
    content_addressed: bool,
) -> Result<Vec<Contract>, ApiError> {
    let results = join_all(accepted.iter().map(|a| a.link().store_block(id, data))).await;

    let mut stored = Vec::with_capacity(accepted.len());
    let mut last_error = None;
    for (placement, result) in accepted.iter().zip(results) {
        match result {
            Ok(()) => {
                saga.written(placement);
                stored.push(placement.contract.clone());
            }
            Err(e) if content_addressed && e.is_already_exists() => {
                saga.already_held(placement);
                stored.push(placement.contract.clone());
            }
            Err(e) => {
                tracing::warn!(
                    block_id = %id,
                    provider = %placement.provider.peer.id,
                    error = %e,
                    "upload failed"
                );
                last_error = Some(e);
            }
        }
    }

    if stored.is_empty() {
        return Err(last_error.unwrap_or_else(|| ApiError::NoProviderAvailable {
            block_id: id.to_string(),
        }));
    }
    Ok(stored)
}
