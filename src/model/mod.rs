//! Data model
//!
//! Storage contracts, file and directory metadata objects, and the peer
//! descriptors exchanged with providers. Everything here is plain data with
//! serde derives; the JSON field names are camelCase because these objects
//! travel over the wire and are stored on remote providers.

pub mod contract;
pub mod metadata;
pub mod peer;

pub use contract::Contract;
pub use metadata::{BlockRef, DirBlock, INodeBlock, NamedBlockRef, StorageOptions, StoragePolicy};
pub use peer::{PeerInfo, ProviderInfo};
