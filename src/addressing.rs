//! Content addressing
//!
//! Deterministic identifiers for data blocks and metadata objects. Block
//! identifiers are the blake3 digest of the block bytes; metadata identifiers
//! hash `owner ":" name`, so a user's root listing (`name = "/"`) can be found
//! without any lookup table. Digests are rendered as lowercase hex, which is
//! safe to use as a file name and as a URL path segment.

use crate::types::BlockId;

/// Name of the per-user root listing.
pub const ROOT_NAME: &str = "/";

/// Compute the content address of a payload.
pub fn content_id(data: &[u8]) -> BlockId {
    hex::encode(blake3::hash(data).as_bytes())
}

/// Compute the identifier of the metadata object `name` owned by `owner`.
pub fn meta_id(owner: &str, name: &str) -> BlockId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(owner.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    hex::encode(hasher.finalize().as_bytes())
}

/// Compute the identifier of `owner`'s root listing.
pub fn root_id(owner: &str) -> BlockId {
    meta_id(owner, ROOT_NAME)
}
