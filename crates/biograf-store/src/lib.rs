//! Durable byte-range chunk storage for offline media assets.
//!
//! # Architecture
//!
//! - [`key`] - Pure key layout: tiers, resource paths, byte spans and prefixes
//! - [`unit`] - Stored unit payloads and their metadata
//! - [`catalog`] - Per-asset records describing what a tier holds
//! - [`SledStore`] / [`MemoryStore`] - The two store implementations
//!
//! Keys are `(tier, resource path, byte range)`. Every key of an asset shares
//! a prefix, so removing an asset is a single prefix deletion.

mod error;
mod memory;
mod sled_store;

pub mod catalog;
pub mod key;
pub mod unit;

pub use catalog::{AssetRecord, Catalog, ResourceRecord};
pub use error::{Result, StoreError};
pub use key::{ByteSpan, KeyPrefix, Tier, UnitKey, covers, resource_path};
pub use memory::MemoryStore;
pub use sled_store::{SledStore, StoreOptions};
pub use unit::{StoredUnit, UnitMeta};

/// Persistent store of cached units.
///
/// Writes are atomic per key: a concurrent reader observes a unit either
/// absent or complete, never half written.
pub trait ChunkStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous unit.
    fn put(&self, key: &UnitKey, bytes: &[u8], meta: &UnitMeta) -> Result<()>;

    /// Load the unit stored under `key`.
    fn get(&self, key: &UnitKey) -> Result<Option<StoredUnit>>;

    /// Delete every unit whose key starts with `prefix`. Returns how many were removed.
    fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<usize>;

    /// Keys under `prefix`, sorted by resource then ascending start offset.
    fn keys(&self, prefix: &KeyPrefix) -> Result<Vec<UnitKey>>;

    /// Make all previous writes durable.
    fn flush(&self) -> Result<()>;
}
