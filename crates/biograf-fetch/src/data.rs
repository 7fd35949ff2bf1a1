//! Immutable data types for fetch configuration and planning input.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One file of an asset.
///
/// `src` is fetched from the origin, relative to the asset root; the bytes
/// are stored under `dest`. Most references use the same name for both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRef {
    pub src: String,
    pub dest: String,
}

impl ManifestRef {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            src: path.clone(),
            dest: path,
        }
    }

    /// Fetch `src` but store it as `dest`.
    pub fn renamed(src: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
        }
    }
}

impl fmt::Display for ManifestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.src == self.dest {
            write!(f, "{}", self.src)
        } else {
            write!(f, "{}={}", self.src, self.dest)
        }
    }
}

/// Configuration for unit fetches.
///
/// # Examples
///
/// ```
/// use biograf_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_retries(5)
///     .retry_backoff(Duration::from_millis(200))
///     .header("Authorization", "Bearer token");
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Maximum number of retry attempts for transient failures.
    ///
    /// - Retries are triggered for network errors, 5xx and 429 responses
    /// - Does not retry other 4xx errors or length mismatches
    /// - Total attempts = 1 (initial) + max_retries
    ///
    /// Default: 3
    pub max_retries: u32,

    /// Base delay for exponential backoff between retries.
    ///
    /// The actual delay for retry N is: `retry_backoff * 2^N`
    ///
    /// Default: 100ms
    pub retry_backoff: Duration,

    /// Custom HTTP headers to include with every request.
    ///
    /// Default: empty
    pub headers: Arc<[(String, String)]>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("headers", &self.headers)
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
            headers: Arc::new([]),
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_ref_display() {
        assert_eq!(ManifestRef::new("poster.jpg").to_string(), "poster.jpg");
        assert_eq!(
            ManifestRef::renamed("mp4/offline-720p.mpd", "mp4/dash.mpd").to_string(),
            "mp4/offline-720p.mpd=mp4/dash.mpd"
        );
    }

    #[test]
    fn headers_accumulate() {
        let options = FetchOptions::default().header("A", "1").header("B", "2");
        assert_eq!(options.headers.len(), 2);
        assert_eq!(options.headers[1], ("B".to_string(), "2".to_string()));
    }
}
