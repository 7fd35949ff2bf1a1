use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use crate::catalog::{self, AssetRecord, Catalog};
use crate::error::{Result, StoreError};
use crate::key::{KeyPrefix, Tier, UnitKey};
use crate::unit::{self, StoredUnit, UnitMeta};
use crate::ChunkStore;

const UNITS_TREE: &str = "units";
const CATALOG_TREE: &str = "catalog";

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Upper bound on stored unit bytes. `None` means unbounded.
    ///
    /// Nothing is evicted when the bound is hit; the write fails instead.
    pub capacity: Option<u64>,
}

impl StoreOptions {
    pub fn capacity(mut self, capacity: Option<u64>) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Durable [`ChunkStore`] and [`Catalog`] on top of `sled`.
pub struct SledStore {
    db: sled::Db,
    units: sled::Tree,
    catalog: sled::Tree,
    capacity: Option<u64>,
    used: AtomicU64,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let db = sled::open(path)?;
        Self::from_db(db, options)
    }

    /// Store that lives only as long as the returned value.
    pub fn temporary(options: StoreOptions) -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db, options)
    }

    fn from_db(db: sled::Db, options: StoreOptions) -> Result<Self> {
        let units = db.open_tree(UNITS_TREE)?;
        let catalog = db.open_tree(CATALOG_TREE)?;

        let mut used = 0u64;
        for entry in units.iter() {
            let (_, value) = entry?;
            used += value.len() as u64;
        }
        debug!("store: opened units={} used_bytes={}", units.len(), used);

        Ok(Self {
            db,
            units,
            catalog,
            capacity: options.capacity,
            used: AtomicU64::new(used),
        })
    }

    /// Bytes currently held by stored units.
    pub fn used_bytes(&self) -> u64 {
        self.used.load(Ordering::Acquire)
    }

    fn release(&self, bytes: u64) {
        let _ = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| Some(used.saturating_sub(bytes)));
    }

    fn reserve(&self, needed: u64, released: u64) -> Result<()> {
        let Some(capacity) = self.capacity else {
            return Ok(());
        };
        let used = self.used_bytes().saturating_sub(released);
        let available = capacity.saturating_sub(used);
        if needed > available {
            return Err(StoreError::CapacityExceeded { needed, available });
        }
        Ok(())
    }
}

impl ChunkStore for SledStore {
    fn put(&self, key: &UnitKey, bytes: &[u8], meta: &UnitMeta) -> Result<()> {
        let raw_key = key.encode();
        let value = unit::encode_value(meta, bytes)?;

        let previous = self.units.get(&raw_key)?.map(|v| v.len() as u64).unwrap_or(0);
        self.reserve(value.len() as u64, previous)?;

        let new_len = value.len() as u64;
        let replaced = self.units.insert(raw_key, value)?.map(|v| v.len() as u64).unwrap_or(0);
        self.used.fetch_add(new_len, Ordering::AcqRel);
        self.release(replaced);

        trace!("store: put {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    fn get(&self, key: &UnitKey) -> Result<Option<StoredUnit>> {
        match self.units.get(key.encode())? {
            Some(raw) => Ok(Some(unit::decode_value(key.clone(), &raw)?)),
            None => Ok(None),
        }
    }

    fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<usize> {
        let mut batch = sled::Batch::default();
        let mut count = 0usize;
        let mut freed = 0u64;

        for entry in self.units.scan_prefix(prefix.encode()) {
            let (key, value) = entry?;
            freed += value.len() as u64;
            batch.remove(key);
            count += 1;
        }

        self.units.apply_batch(batch)?;
        self.release(freed);

        debug!("store: deleted {} units under {:?}", count, prefix);
        Ok(count)
    }

    fn keys(&self, prefix: &KeyPrefix) -> Result<Vec<UnitKey>> {
        let mut keys = Vec::new();
        for key in self.units.scan_prefix(prefix.encode()).keys() {
            keys.push(UnitKey::decode(&key?)?);
        }
        Ok(keys)
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl Catalog for SledStore {
    fn put_record(&self, record: &AssetRecord) -> Result<()> {
        let key = catalog::record_key(record.tier, &record.root);
        let value = catalog::encode_record(record)?;
        self.catalog.insert(key, value)?;
        Ok(())
    }

    fn record(&self, tier: Tier, root: &str) -> Result<Option<AssetRecord>> {
        let data = self.catalog.get(catalog::record_key(tier, root))?;
        if let Some(data) = data {
            Ok(Some(catalog::decode_record(&data)?))
        } else {
            Ok(None)
        }
    }

    fn records(&self, tier: Tier) -> Result<Vec<AssetRecord>> {
        let mut records = Vec::new();
        for entry in self.catalog.scan_prefix(catalog::record_prefix(tier)) {
            let (_, val) = entry?;
            records.push(catalog::decode_record(&val)?);
        }
        Ok(records)
    }

    fn delete_record(&self, tier: Tier, root: &str) -> Result<bool> {
        Ok(self.catalog.remove(catalog::record_key(tier, root))?.is_some())
    }
}
