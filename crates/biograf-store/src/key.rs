//! Key layout for cached units.
//!
//! Units live at `u:<tier>:<hex(path)>:<start>-<end>` where offsets are
//! zero-padded hex, so lexicographic key order is resource order followed by
//! ascending offset. Hex encoding keeps `:` out of the path component and
//! preserves prefixes: every resource under `show/ep1/` shares the prefix
//! `u:<tier>:<hex("show/ep1/")>`.
//!
//! This module does not perform any IO.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, StoreError};

const UNIT_NS: &str = "u";

/// Which kind of download produced a unit.
///
/// The two tiers never share keys, so a partial prefetch can never satisfy the
/// existence check used for a full offline copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Full, user-requested offline copy.
    Offline,
    /// Partial, silent background warm-up.
    Prefetch,
}

impl Tier {
    pub fn tag(self) -> &'static str {
        match self {
            Tier::Offline => "o",
            Tier::Prefetch => "p",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "o" => Some(Tier::Offline),
            "p" => Some(Tier::Prefetch),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Offline => write!(f, "offline"),
            Tier::Prefetch => write!(f, "prefetch"),
        }
    }
}

/// Half-open byte interval `[start, end)` within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteSpan {
    pub start: u64,
    pub end: u64,
}

impl ByteSpan {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "span start {start} past end {end}");
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Overlap with `other`, if any.
    pub fn intersect(&self, other: &ByteSpan) -> Option<ByteSpan> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(ByteSpan { start, end })
    }
}

impl fmt::Display for ByteSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Normalize a logical resource path: query and fragment dropped, no leading
/// or trailing slash.
///
/// ```
/// use biograf_store::resource_path;
///
/// assert_eq!(resource_path("/show/ep1/mp4/dash.mpd?v=2"), "show/ep1/mp4/dash.mpd");
/// assert_eq!(resource_path("show/ep1/"), "show/ep1");
/// ```
pub fn resource_path(raw: &str) -> String {
    let no_query = raw.split(['?', '#']).next().unwrap_or(raw);
    no_query.trim_matches('/').to_string()
}

/// Identity of one stored unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitKey {
    pub tier: Tier,
    pub path: String,
    pub span: ByteSpan,
}

impl UnitKey {
    pub fn new(tier: Tier, path: &str, span: ByteSpan) -> Self {
        Self {
            tier,
            path: resource_path(path),
            span,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        format!(
            "{UNIT_NS}:{}:{}:{:016x}-{:016x}",
            self.tier.tag(),
            hex::encode(&self.path),
            self.span.start,
            self.span.end
        )
        .into_bytes()
    }

    pub fn decode(raw: &[u8]) -> Result<Self> {
        let invalid = || StoreError::InvalidKey(String::from_utf8_lossy(raw).into_owned());

        let text = std::str::from_utf8(raw).map_err(|_| invalid())?;
        let mut parts = text.splitn(4, ':');
        let (Some(UNIT_NS), Some(tier), Some(path), Some(span)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let tier = Tier::from_tag(tier).ok_or_else(invalid)?;
        let path = hex::decode(path)
            .ok()
            .and_then(|p| String::from_utf8(p).ok())
            .ok_or_else(invalid)?;
        let (start, end) = span.split_once('-').ok_or_else(invalid)?;
        let start = u64::from_str_radix(start, 16).map_err(|_| invalid())?;
        let end = u64::from_str_radix(end, 16).map_err(|_| invalid())?;
        if start > end {
            return Err(invalid());
        }

        Ok(Self {
            tier,
            path,
            span: ByteSpan { start, end },
        })
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.tier, self.path, self.span)
    }
}

/// Selects a group of units for listing or deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Every unit of a tier.
    Tier(Tier),
    /// Every unit of every resource below an asset root.
    Asset { tier: Tier, root: String },
    /// Every unit of exactly one resource.
    Resource { tier: Tier, path: String },
}

impl KeyPrefix {
    pub fn asset(tier: Tier, root: &str) -> Self {
        KeyPrefix::Asset {
            tier,
            root: resource_path(root),
        }
    }

    pub fn resource(tier: Tier, path: &str) -> Self {
        KeyPrefix::Resource {
            tier,
            path: resource_path(path),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let prefix = match self {
            KeyPrefix::Tier(tier) => format!("{UNIT_NS}:{}:", tier.tag()),
            KeyPrefix::Asset { tier, root } if root.is_empty() => {
                format!("{UNIT_NS}:{}:", tier.tag())
            }
            KeyPrefix::Asset { tier, root } => {
                format!("{UNIT_NS}:{}:{}", tier.tag(), hex::encode(format!("{root}/")))
            }
            KeyPrefix::Resource { tier, path } => {
                format!("{UNIT_NS}:{}:{}:", tier.tag(), hex::encode(path))
            }
        };
        trace!("store_key: prefix {:?} -> '{}'", self, prefix);
        prefix.into_bytes()
    }
}

/// Whether `spans`, sorted by start, cover `wanted` without a gap.
///
/// Overlapping spans are tolerated; only holes make the answer `false`.
/// An empty `wanted` interval is always covered.
pub fn covers(spans: &[ByteSpan], wanted: ByteSpan) -> bool {
    let mut pos = wanted.start;
    for span in spans {
        if pos >= wanted.end {
            break;
        }
        if span.end <= pos {
            continue;
        }
        if span.start > pos {
            return false;
        }
        pos = span.end;
    }
    pos >= wanted.end
}
