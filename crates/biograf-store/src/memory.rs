use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::catalog::{self, AssetRecord, Catalog};
use crate::error::Result;
use crate::key::{KeyPrefix, Tier, UnitKey};
use crate::unit::{self, StoredUnit, UnitMeta};
use crate::ChunkStore;

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// Non-durable store with the same key layout as [`SledStore`](crate::SledStore).
///
/// Useful for tests and for running without a writable data directory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    units: RwLock<Map>,
    catalog: RwLock<Map>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit_count(&self) -> usize {
        read(&self.units).len()
    }
}

fn read(lock: &RwLock<Map>) -> RwLockReadGuard<'_, Map> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(lock: &RwLock<Map>) -> RwLockWriteGuard<'_, Map> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn scan<'a>(map: &'a Map, prefix: &'a [u8]) -> impl Iterator<Item = (&'a Vec<u8>, &'a Vec<u8>)> + 'a {
    map.range(prefix.to_vec()..)
        .take_while(move |(k, _)| k.starts_with(prefix))
}

impl ChunkStore for MemoryStore {
    fn put(&self, key: &UnitKey, bytes: &[u8], meta: &UnitMeta) -> Result<()> {
        let value = unit::encode_value(meta, bytes)?;
        write(&self.units).insert(key.encode(), value);
        Ok(())
    }

    fn get(&self, key: &UnitKey) -> Result<Option<StoredUnit>> {
        let units = read(&self.units);
        match units.get(&key.encode()) {
            Some(raw) => Ok(Some(unit::decode_value(key.clone(), raw)?)),
            None => Ok(None),
        }
    }

    fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<usize> {
        let prefix = prefix.encode();
        let mut units = write(&self.units);
        let doomed: Vec<Vec<u8>> = scan(&units, &prefix).map(|(k, _)| k.clone()).collect();
        for key in &doomed {
            units.remove(key);
        }
        Ok(doomed.len())
    }

    fn keys(&self, prefix: &KeyPrefix) -> Result<Vec<UnitKey>> {
        let prefix = prefix.encode();
        let units = read(&self.units);
        scan(&units, &prefix).map(|(k, _)| UnitKey::decode(k)).collect()
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

impl Catalog for MemoryStore {
    fn put_record(&self, record: &AssetRecord) -> Result<()> {
        let value = catalog::encode_record(record)?;
        write(&self.catalog).insert(catalog::record_key(record.tier, &record.root), value);
        Ok(())
    }

    fn record(&self, tier: Tier, root: &str) -> Result<Option<AssetRecord>> {
        let records = read(&self.catalog);
        records
            .get(&catalog::record_key(tier, root))
            .map(|raw| catalog::decode_record(raw))
            .transpose()
    }

    fn records(&self, tier: Tier) -> Result<Vec<AssetRecord>> {
        let prefix = catalog::record_prefix(tier);
        let records = read(&self.catalog);
        scan(&records, &prefix)
            .map(|(_, v)| catalog::decode_record(v))
            .collect()
    }

    fn delete_record(&self, tier: Tier, root: &str) -> Result<bool> {
        Ok(write(&self.catalog)
            .remove(&catalog::record_key(tier, root))
            .is_some())
    }
}
