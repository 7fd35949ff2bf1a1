//! Turns an asset's manifest references into ordered fetch units.

use url::Url;

use crate::core::{CHUNK_SIZE, Segment, chunk_segments, guess_content_type, prefix_len};
use crate::data::ManifestRef;
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::error::{Error, Result};

/// One resource of an asset, resolved and split into units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedResource {
    /// Where the bytes are fetched from.
    pub url: Url,
    /// Logical path the bytes are stored under (`<root>/<dest>`).
    pub path: String,
    /// Total length reported by the origin.
    pub length: u64,
    /// Bytes covered by `segments`; equals `length` unless prefix-limited.
    pub planned: u64,
    pub content_type: Option<String>,
    pub segments: Vec<Segment>,
}

impl PlannedResource {
    pub fn is_partial(&self) -> bool {
        self.planned < self.length
    }
}

/// Plans resources into fixed-size units.
#[derive(Debug, Clone, Copy)]
pub struct SegmentPlanner {
    chunk_size: u64,
}

impl Default for SegmentPlanner {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
        }
    }
}

impl SegmentPlanner {
    pub fn new(chunk_size: u64) -> Self {
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Plan every reference in full.
    ///
    /// # Errors
    ///
    /// Fails on the first resource whose length cannot be determined.
    pub async fn plan<C: HttpClient>(
        &self,
        fetcher: &Fetcher<C>,
        root: &str,
        refs: &[ManifestRef],
    ) -> Result<Vec<PlannedResource>> {
        self.plan_limited(fetcher, root, refs, None).await
    }

    /// Plan only the leading `budget` bytes of each reference, rounded up to a
    /// whole unit. Resources shorter than that are planned whole.
    pub async fn plan_prefix<C: HttpClient>(
        &self,
        fetcher: &Fetcher<C>,
        root: &str,
        refs: &[ManifestRef],
        budget: u64,
    ) -> Result<Vec<PlannedResource>> {
        self.plan_limited(fetcher, root, refs, Some(budget)).await
    }

    async fn plan_limited<C: HttpClient>(
        &self,
        fetcher: &Fetcher<C>,
        root: &str,
        refs: &[ManifestRef],
        budget: Option<u64>,
    ) -> Result<Vec<PlannedResource>> {
        let root = root.trim_matches('/');
        let mut planned = Vec::with_capacity(refs.len());

        for reference in refs {
            let url = fetcher.resolve(&join(root, &reference.src))?;
            let head = fetcher.head(&url).await?;
            let length = head.content_length.ok_or_else(|| Error::UnknownLength {
                url: url.to_string(),
            })?;

            let limit = match budget {
                Some(budget) => prefix_len(length, self.chunk_size, budget),
                None => length,
            };
            let segments = chunk_segments(limit, self.chunk_size)?;
            let content_type = head
                .content_type
                .or_else(|| guess_content_type(&reference.dest).map(str::to_string));

            tracing::debug!(%url, length, planned = limit, units = segments.len(), "planned resource");
            planned.push(PlannedResource {
                url,
                path: join(root, &reference.dest),
                length,
                planned: limit,
                content_type,
                segments,
            });
        }

        Ok(planned)
    }
}

/// Total bytes a plan will download.
pub fn planned_bytes(resources: &[PlannedResource]) -> u64 {
    resources.iter().map(|r| r.planned).sum()
}

fn join(root: &str, file: &str) -> String {
    let file = file.trim_start_matches('/');
    if root.is_empty() {
        file.to_string()
    } else {
        format!("{root}/{file}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_paths() {
        assert_eq!(join("show/ep-1", "mp4/dash.mpd"), "show/ep-1/mp4/dash.mpd");
        assert_eq!(join("", "/poster.jpg"), "poster.jpg");
    }

    #[test]
    fn test_default_chunk_size() {
        assert_eq!(SegmentPlanner::default().chunk_size(), CHUNK_SIZE);
    }
}
