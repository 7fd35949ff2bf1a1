use std::future::Future;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use url::Url;

use crate::core::{range_header, retry_delay};
use crate::data::FetchOptions;
use crate::effects::http::{HeadInfo, HttpClient, TransportResponse};
use crate::error::{Error, Result};

/// Fetches byte ranges of resources below one origin.
pub struct Fetcher<C: HttpClient> {
    client: C,
    origin: Url,
    options: FetchOptions,
}

impl<C: HttpClient> Fetcher<C> {
    /// Create a fetcher rooted at `origin`.
    ///
    /// A trailing `/` is added if missing so relative paths resolve below it.
    pub fn new(client: C, origin: &str) -> Result<Self> {
        let origin = if origin.ends_with('/') {
            Url::parse(origin)?
        } else {
            Url::parse(&format!("{origin}/"))?
        };
        Ok(Self {
            client,
            origin,
            options: FetchOptions::default(),
        })
    }

    #[must_use]
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Resolve a path relative to the origin.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.origin.join(path.trim_start_matches('/'))?)
    }

    pub async fn head(&self, url: &Url) -> Result<HeadInfo> {
        self.with_retry(url, move || async move {
            self.client
                .head(url.as_str())
                .await
                .map_err(|e| Error::Network(e.to_string()))
        })
        .await
    }

    /// Total length of the resource at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLength`] when the origin reports no length.
    pub async fn content_length(&self, url: &Url) -> Result<u64> {
        self.head(url).await?.content_length.ok_or_else(|| Error::UnknownLength {
            url: url.to_string(),
        })
    }

    /// Send a GET with the configured headers plus `extra`.
    ///
    /// The response is returned whatever its status.
    pub async fn send(
        &self,
        url: &Url,
        extra: &[(String, String)],
    ) -> Result<TransportResponse<C::Error>> {
        let mut headers: Vec<(String, String)> = self.options.headers.iter().cloned().collect();
        headers.extend(extra.iter().cloned());
        self.client
            .send(url.as_str(), &headers)
            .await
            .map_err(|e| Error::Network(e.to_string()))
    }

    /// Fetch bytes `[start, end)` of the resource at `url`.
    ///
    /// Transient failures are retried with exponential backoff. An origin that
    /// ignores the `Range` header still yields exactly the requested slice.
    pub async fn fetch_range(&self, url: &Url, start: u64, end: u64) -> Result<Bytes> {
        if end <= start {
            return Ok(Bytes::new());
        }
        self.with_retry(url, move || self.fetch_range_once(url, start, end))
            .await
    }

    async fn fetch_range_once(&self, url: &Url, start: u64, end: u64) -> Result<Bytes> {
        let expected = end - start;
        let range = [("Range".to_string(), range_header(start, end))];
        let mut response = self.send(url, &range).await?;

        let (skip, take) = match response.status {
            206 => (0, expected),
            // Range ignored; the full body starts at offset zero.
            200 => (start, expected),
            status => {
                return Err(Error::HttpStatus {
                    status,
                    url: url.to_string(),
                });
            }
        };

        let mut buf = BytesMut::with_capacity(expected as usize);
        let mut position = 0u64;
        while let Some(chunk) = response.body.next().await {
            let chunk = chunk.map_err(|e| Error::Network(e.to_string()))?;
            let chunk_end = position + chunk.len() as u64;

            if chunk_end > skip {
                let from = skip.saturating_sub(position) as usize;
                let room = (take - buf.len() as u64) as usize;
                let to = chunk.len().min(from + room);
                buf.extend_from_slice(&chunk[from..to]);
            }
            position = chunk_end;

            if buf.len() as u64 == take {
                break;
            }
        }

        if buf.len() as u64 != expected {
            return Err(Error::UnexpectedLength {
                url: url.to_string(),
                expected,
                actual: buf.len() as u64,
            });
        }
        Ok(buf.freeze())
    }

    async fn with_retry<T, F, Fut>(&self, url: &Url, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0u32;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retries < self.options.max_retries => {
                    let delay = retry_delay(retries, self.options.retry_backoff);
                    tracing::warn!(%url, error = %e, retry = retries + 1, ?delay, "retrying request");
                    tokio::time::sleep(delay).await;
                    retries += 1;
                }
                Err(e) if e.is_transient() && retries > 0 => {
                    return Err(Error::MaxRetriesExceeded {
                        count: retries + 1,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoClient;

    impl HttpClient for NoClient {
        type Error = std::io::Error;

        async fn send(
            &self,
            _url: &str,
            _headers: &[(String, String)],
        ) -> std::result::Result<TransportResponse<Self::Error>, Self::Error> {
            Err(std::io::Error::other("offline"))
        }

        async fn head(&self, _url: &str) -> std::result::Result<HeadInfo, Self::Error> {
            Err(std::io::Error::other("offline"))
        }
    }

    #[test]
    fn test_origin_gets_trailing_slash() {
        let fetcher = Fetcher::new(NoClient, "https://cdn.example.com/v").unwrap();
        assert_eq!(fetcher.origin().as_str(), "https://cdn.example.com/v/");
        assert_eq!(
            fetcher.resolve("/videos/a/mp4/dash.mpd").unwrap().as_str(),
            "https://cdn.example.com/v/videos/a/mp4/dash.mpd"
        );
    }

    #[test]
    fn test_invalid_origin() {
        assert!(matches!(
            Fetcher::new(NoClient, "not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
