//! Blockrent: Replicated Block Storage
//!
//! Files are split into content-addressed blocks, each block is placed with
//! one or more peer providers under a negotiated storage contract, and the
//! file and directory metadata is stored the same way so a user's listing
//! survives the loss of their own machine.

pub mod addressing;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod negotiation;
pub mod provider;
pub mod registry;
pub mod repo;
pub mod store;
pub mod types;
