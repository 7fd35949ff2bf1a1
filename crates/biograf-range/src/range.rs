//! `Range` header parsing and resolution.
//!
//! Only single byte ranges are understood. Multipart ranges are treated as
//! malformed.

use std::fmt;

use biograf_store::ByteSpan;

use crate::error::{RangeError, Result};

const BYTES_PREFIX: &str = "bytes=";

/// A byte range as written in a request, before the resource length is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=start-end`, both inclusive.
    Bounded { start: u64, end: u64 },
    /// `bytes=start-`
    From(u64),
    /// `bytes=-len`: the last `len` bytes.
    Suffix(u64),
}

impl ByteRange {
    pub fn parse(value: &str) -> Result<Self> {
        let malformed = || RangeError::Malformed(value.to_string());

        let spec = value.trim().strip_prefix(BYTES_PREFIX).ok_or_else(malformed)?;
        if spec.contains(',') {
            return Err(malformed());
        }
        let (start, end) = spec.split_once('-').ok_or_else(malformed)?;
        let (start, end) = (start.trim(), end.trim());

        let number = |s: &str| s.parse::<u64>().map_err(|_| malformed());
        match (start.is_empty(), end.is_empty()) {
            (true, true) => Err(malformed()),
            (true, false) => Ok(ByteRange::Suffix(number(end)?)),
            (false, true) => Ok(ByteRange::From(number(start)?)),
            (false, false) => Ok(ByteRange::Bounded {
                start: number(start)?,
                end: number(end)?,
            }),
        }
    }

    /// Resolve against a resource of `length` bytes.
    ///
    /// An `end` past the resource is clamped to the last byte.
    ///
    /// # Errors
    ///
    /// [`RangeError::NotSatisfiable`] when the range selects no byte: start at
    /// or past the end, start after end, or an empty suffix.
    pub fn resolve(self, length: u64) -> Result<ResolvedRange> {
        let unsatisfiable = || RangeError::NotSatisfiable {
            range: self.to_string(),
            length,
        };
        let last = length.checked_sub(1).ok_or_else(unsatisfiable)?;

        let (start, end) = match self {
            ByteRange::Bounded { start, end } => {
                if start > end || start > last {
                    return Err(unsatisfiable());
                }
                (start, end.min(last))
            }
            ByteRange::From(start) => {
                if start > last {
                    return Err(unsatisfiable());
                }
                (start, last)
            }
            ByteRange::Suffix(0) => return Err(unsatisfiable()),
            ByteRange::Suffix(len) => (length.saturating_sub(len), last),
        };

        Ok(ResolvedRange { start, end, length })
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteRange::Bounded { start, end } => write!(f, "{BYTES_PREFIX}{start}-{end}"),
            ByteRange::From(start) => write!(f, "{BYTES_PREFIX}{start}-"),
            ByteRange::Suffix(len) => write!(f, "{BYTES_PREFIX}-{len}"),
        }
    }
}

/// A satisfiable range: `start..=end` within a resource of `length` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub length: u64,
}

// A resolved range always holds at least one byte.
#[allow(clippy::len_without_is_empty)]
impl ResolvedRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// The same bytes as a half-open span.
    pub fn span(&self) -> ByteSpan {
        ByteSpan::new(self.start, self.end + 1)
    }

    /// `Content-Range` value of a 206 response.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.length)
    }
}

/// `Content-Range` value of a 416 response.
pub fn unsatisfied_range(length: u64) -> String {
    format!("bytes */{length}")
}
