//! Shared foundational types used across the Tessera incremental cache.
//!
//! This crate provides content hashing for artifact fingerprints and the
//! canonical source identity used to key every cached record.

#![warn(missing_docs)]

pub mod hash;
pub mod source_id;

pub use hash::{ContentHash, ParseHashError};
pub use source_id::{SourceId, SourceIdError};
