use biograf_store::{
    AssetRecord, ByteSpan, Catalog, ChunkStore, KeyPrefix, MemoryStore, ResourceRecord, SledStore,
    StoreOptions, Tier, UnitKey, UnitMeta,
};

fn meta(total: u64) -> UnitMeta {
    UnitMeta {
        content_type: Some("video/mp4".into()),
        total_length: total,
    }
}

fn fill<S: ChunkStore>(store: &S) {
    for (tier, path, start, end) in [
        (Tier::Offline, "show/ep1/mp4/v.mp4", 0, 4),
        (Tier::Offline, "show/ep1/mp4/v.mp4", 4, 8),
        (Tier::Offline, "show/ep1/poster.jpg", 0, 2),
        (Tier::Offline, "show/ep10/poster.jpg", 0, 2),
        (Tier::Prefetch, "show/ep1/mp4/v.mp4", 0, 4),
    ] {
        let key = UnitKey::new(tier, path, ByteSpan::new(start, end));
        let payload: Vec<u8> = (start..end).map(|b| b as u8).collect();
        store.put(&key, &payload, &meta(8)).unwrap();
    }
}

fn exercise_prefixes<S: ChunkStore>(store: &S) {
    fill(store);

    let resource = store
        .keys(&KeyPrefix::resource(Tier::Offline, "show/ep1/mp4/v.mp4"))
        .unwrap();
    let spans: Vec<_> = resource.iter().map(|k| k.span).collect();
    assert_eq!(spans, vec![ByteSpan::new(0, 4), ByteSpan::new(4, 8)]);

    let unit = store.get(&resource[1]).unwrap().unwrap();
    assert_eq!(unit.bytes, vec![4, 5, 6, 7]);
    assert_eq!(unit.meta.total_length, 8);

    let removed = store.delete_prefix(&KeyPrefix::asset(Tier::Offline, "show/ep1")).unwrap();
    assert_eq!(removed, 3);

    assert!(store.keys(&KeyPrefix::asset(Tier::Offline, "show/ep1")).unwrap().is_empty());
    assert_eq!(store.keys(&KeyPrefix::asset(Tier::Offline, "show/ep10")).unwrap().len(), 1);
    assert_eq!(store.keys(&KeyPrefix::Tier(Tier::Prefetch)).unwrap().len(), 1);

    assert_eq!(store.delete_prefix(&KeyPrefix::asset(Tier::Offline, "show/ep1")).unwrap(), 0);
}

fn exercise_catalog<S: Catalog>(store: &S) {
    let mut record = AssetRecord::new("episode-1", "/show/ep1/", Tier::Offline);
    record.resources.push(ResourceRecord {
        path: "show/ep1/poster.jpg".into(),
        length: 2,
        planned: 2,
        content_type: None,
    });
    store.put_record(&record).unwrap();

    let loaded = store.record(Tier::Offline, "show/ep1").unwrap().unwrap();
    assert_eq!(loaded, record);
    assert!(store.record(Tier::Prefetch, "show/ep1").unwrap().is_none());
    assert_eq!(store.records(Tier::Offline).unwrap().len(), 1);

    assert!(store.delete_record(Tier::Offline, "show/ep1").unwrap());
    assert!(!store.delete_record(Tier::Offline, "show/ep1").unwrap());
}

#[test]
fn memory_store_prefixes() {
    exercise_prefixes(&MemoryStore::new());
}

#[test]
fn sled_store_prefixes() {
    exercise_prefixes(&SledStore::temporary(StoreOptions::default()).unwrap());
}

#[test]
fn memory_store_catalog() {
    exercise_catalog(&MemoryStore::new());
}

#[test]
fn sled_store_catalog() {
    exercise_catalog(&SledStore::temporary(StoreOptions::default()).unwrap());
}

#[test]
fn sled_store_survives_reopen() {
    let dir = tempfile::Builder::new()
        .prefix("biograf-store-")
        .tempdir()
        .unwrap();
    let key = UnitKey::new(Tier::Offline, "show/ep1/mp4/a.mp4", ByteSpan::new(0, 3));

    {
        let store = SledStore::open(dir.path(), StoreOptions::default()).unwrap();
        store.put(&key, b"abc", &meta(3)).unwrap();
        store.put_record(&AssetRecord::new("episode-1", "show/ep1", Tier::Offline)).unwrap();
        store.flush().unwrap();
    }

    let store = SledStore::open(dir.path(), StoreOptions::default()).unwrap();
    assert_eq!(store.get(&key).unwrap().unwrap().bytes, b"abc");
    assert!(store.used_bytes() > 0);
    assert!(store.record(Tier::Offline, "show/ep1").unwrap().is_some());
}
