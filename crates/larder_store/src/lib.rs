//! # Larder Store
//!
//! Local state for the Larder sync client.
//!
//! This crate provides:
//! - [`CacheStore`] — the durable keyed-blob cache trait
//! - [`MemoryCache`] — an in-memory cache for tests and ephemeral runs
//! - [`Collections`] — the four in-memory collections that are the unit of
//!   truth between sync cycles
//!
//! Every collection mutation is mirrored into the cache immediately, so the
//! application can start from cached state before any remote contact
//! succeeds.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod collections;
mod error;

pub use cache::{keys, CacheStore, MemoryCache};
pub use collections::Collections;
pub use error::{StoreError, StoreResult};
