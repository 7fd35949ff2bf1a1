//! Per-asset records.
//!
//! A record lists the resources an asset download planned and whether every
//! unit of them reached the store. The `complete` flag is only written after
//! the last unit is durable, so readers never mistake a partial download for
//! a finished one.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::key::{ByteSpan, Tier, resource_path};

const RECORD_NS: &str = "a";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Logical path the units are stored under.
    pub path: String,
    /// Length of the whole resource at the origin.
    pub length: u64,
    /// Number of leading bytes the download planned to store.
    ///
    /// Equals `length` for offline downloads; prefetches may stop short.
    pub planned: u64,
    pub content_type: Option<String>,
}

impl ResourceRecord {
    pub fn planned_span(&self) -> ByteSpan {
        ByteSpan::new(0, self.planned)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Asset slug for offline copies, composite manifest path for prefetches.
    pub name: String,
    pub root: String,
    pub page_path: Option<String>,
    pub tier: Tier,
    pub resources: Vec<ResourceRecord>,
    pub complete: bool,
}

impl AssetRecord {
    pub fn new(name: impl Into<String>, root: &str, tier: Tier) -> Self {
        Self {
            name: name.into(),
            root: resource_path(root),
            page_path: None,
            tier,
            resources: Vec::new(),
            complete: false,
        }
    }

    pub fn planned_bytes(&self) -> u64 {
        self.resources.iter().map(|r| r.planned).sum()
    }
}

/// Storage for [`AssetRecord`]s, keyed by tier and asset root.
pub trait Catalog: Send + Sync {
    fn put_record(&self, record: &AssetRecord) -> Result<()>;

    fn record(&self, tier: Tier, root: &str) -> Result<Option<AssetRecord>>;

    fn records(&self, tier: Tier) -> Result<Vec<AssetRecord>>;

    /// Returns `true` if a record was removed.
    fn delete_record(&self, tier: Tier, root: &str) -> Result<bool>;
}

pub(crate) fn record_key(tier: Tier, root: &str) -> Vec<u8> {
    format!("{RECORD_NS}:{}:{}", tier.tag(), hex::encode(resource_path(root))).into_bytes()
}

pub(crate) fn record_prefix(tier: Tier) -> Vec<u8> {
    format!("{RECORD_NS}:{}:", tier.tag()).into_bytes()
}

pub(crate) fn encode_record(record: &AssetRecord) -> Result<Vec<u8>> {
    Ok(postcard::to_stdvec(record)?)
}

pub(crate) fn decode_record(raw: &[u8]) -> Result<AssetRecord> {
    Ok(postcard::from_bytes(raw)?)
}
