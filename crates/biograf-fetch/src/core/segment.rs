use crate::error::{Error, Result};

/// Unit size for offline and prefetch downloads: half a megabyte.
pub const CHUNK_SIZE: u64 = 512 * 1024;

/// A byte range of a resource to be fetched as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Segment index (0-based)
    pub index: u32,
    /// Starting byte offset
    pub start: u64,
    /// Ending byte offset (exclusive)
    pub end: u64,
}

impl Segment {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Split the first `limit` bytes of a resource into fixed-size units.
///
/// Every unit except possibly the last is exactly `chunk_size` bytes. A zero
/// `limit` yields no units.
///
/// # Errors
///
/// Returns [`Error::InvalidState`] if `chunk_size` is 0.
pub fn chunk_segments(limit: u64, chunk_size: u64) -> Result<Vec<Segment>> {
    if chunk_size == 0 {
        return Err(Error::InvalidState("chunk size must be greater than 0".into()));
    }

    let count = limit.div_ceil(chunk_size);
    let mut segments = Vec::with_capacity(count as usize);
    let mut start = 0;
    let mut index = 0u32;

    while start < limit {
        let end = (start + chunk_size).min(limit);
        segments.push(Segment { index, start, end });
        start = end;
        index += 1;
    }

    Ok(segments)
}

/// Number of leading bytes to plan when only `budget` bytes are wanted.
///
/// The budget is rounded up to a whole chunk so partial downloads always end
/// on a chunk boundary (or at the end of the resource).
pub fn prefix_len(length: u64, chunk_size: u64, budget: u64) -> u64 {
    if chunk_size == 0 {
        return length.min(budget);
    }
    let aligned = budget.div_ceil(chunk_size).saturating_mul(chunk_size);
    length.min(aligned)
}
