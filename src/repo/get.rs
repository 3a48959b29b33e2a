//! Retrieving a stored file.

use super::Repo;
use crate::addressing::{content_id, meta_id};
use crate::error::ApiError;
use crate::model::BlockRef;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};

impl Repo {
    /// Stream the file stored as `name` into `out`, block by block.
    ///
    /// Each block is fetched from the first contract whose provider returns
    /// bytes matching the block's content address. Bytes already written stay
    /// written if a later block is unavailable. Returns the number of bytes
    /// written.
    pub async fn get<W>(&self, name: &str, out: &mut W) -> Result<u64, ApiError>
    where
        W: AsyncWrite + Unpin,
    {
        let id = meta_id(&self.config.user_id, name);
        let inode = self
            .metadata
            .load_inode(&id)?
            .ok_or_else(|| ApiError::FileNotFound(name.to_string()))?;

        let mut written = 0u64;
        for block in &inode.blocks {
            let data = self.fetch_block(block).await?;
            out.write_all(&data).await?;
            written += data.len() as u64;
        }
        out.flush().await?;

        tracing::info!(name = %name, blocks = inode.blocks.len(), bytes = written, "retrieved file");
        Ok(written)
    }

    /// `get` into a file at `dest`, created or truncated.
    pub async fn get_to_path(&self, name: &str, dest: &Path) -> Result<u64, ApiError> {
        let mut file = tokio::fs::File::create(dest).await?;
        self.get(name, &mut file).await
    }

    async fn fetch_block(&self, block: &BlockRef) -> Result<Vec<u8>, ApiError> {
        for contract in &block.contracts {
            let provider = match self.connect(&contract.provider_id).await {
                Ok(provider) => provider,
                Err(e) => {
                    tracing::warn!(block_id = %block.id, provider = %contract.provider_id, error = %e, "skipping provider");
                    continue;
                }
            };
            match provider.link.get_block(&block.id).await {
                Ok(data) if content_id(&data) == block.id => return Ok(data),
                Ok(_) => {
                    tracing::warn!(block_id = %block.id, provider = %contract.provider_id, "block content does not match its id");
                }
                Err(e) => {
                    tracing::warn!(block_id = %block.id, provider = %contract.provider_id, error = %e, "download failed");
                }
            }
        }
        Err(ApiError::BlockUnavailable(block.id.clone()))
    }
}
