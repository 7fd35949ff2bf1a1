use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::key::UnitKey;

/// Metadata stored alongside every unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMeta {
    /// `Content-Type` of the parent resource.
    pub content_type: Option<String>,
    /// Length of the whole parent resource, not of this unit.
    pub total_length: u64,
}

/// A unit read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUnit {
    pub key: UnitKey,
    pub meta: UnitMeta,
    pub bytes: Vec<u8>,
}

#[derive(Serialize)]
struct UnitValueRef<'a> {
    meta: &'a UnitMeta,
    bytes: &'a [u8],
}

#[derive(Deserialize)]
struct UnitValue {
    meta: UnitMeta,
    bytes: Vec<u8>,
}

pub(crate) fn encode_value(meta: &UnitMeta, bytes: &[u8]) -> Result<Vec<u8>> {
    Ok(postcard::to_stdvec(&UnitValueRef { meta, bytes })?)
}

pub(crate) fn decode_value(key: UnitKey, raw: &[u8]) -> Result<StoredUnit> {
    let value: UnitValue = postcard::from_bytes(raw)?;
    Ok(StoredUnit {
        key,
        meta: value.meta,
        bytes: value.bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{ByteSpan, Tier};

    #[test]
    fn value_keeps_payload_and_meta() {
        let key = UnitKey::new(Tier::Offline, "show/ep1/poster.jpg", ByteSpan::new(0, 4));
        let meta = UnitMeta {
            content_type: Some("image/jpeg".into()),
            total_length: 4,
        };
        let raw = encode_value(&meta, b"\xff\xd8\xff\xe0").unwrap();
        let unit = decode_value(key.clone(), &raw).unwrap();
        assert_eq!(unit.key, key);
        assert_eq!(unit.meta, meta);
        assert_eq!(unit.bytes, b"\xff\xd8\xff\xe0");
    }
}
