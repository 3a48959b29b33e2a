//! Core identifier types for the block storage engine.

/// BlockId: content address of a data block, or the derived address of a
/// metadata object (file inode or root listing)
pub type BlockId = String;

/// UserId: stable identifier of the renting user
pub type UserId = String;

/// ProviderId: stable identifier of a storage provider node
pub type ProviderId = String;
