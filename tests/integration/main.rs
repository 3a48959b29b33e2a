//! Integration tests for the replicated block storage engine

mod negotiation;
mod put_get;
mod support;
mod sync;
