use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// What a HEAD probe learned about a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadInfo {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

/// A response as delivered by the transport, body not yet read.
pub struct TransportResponse<E> {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

impl<E> TransportResponse<E> {
    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl<E> fmt::Debug for TransportResponse<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .field("body", &"{ ... }")
            .finish()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface needed to plan and fetch units.
/// Implementations handle their own redirect following, timeout configuration,
/// and error mapping.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a GET request and return the response with its body as a stream.
    ///
    /// Non-2xx statuses are not errors at this level; they are returned so the
    /// caller can decide (an interceptor forwards them untouched).
    fn send(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<TransportResponse<Self::Error>, Self::Error>> + Send;

    /// Query length and type without downloading the body.
    ///
    /// `content_length` is `None` when the origin does not send one
    /// (e.g. chunked transfer encoding).
    fn head(&self, url: &str) -> impl Future<Output = std::result::Result<HeadInfo, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    fn header_str<'a>(headers: &'a HeaderMap, name: reqwest::header::HeaderName) -> Option<&'a str> {
        headers.get(name).and_then(|v| v.to_str().ok())
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn send(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<TransportResponse<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);
            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?;
            let response_headers = response.headers();
            let content_length =
                header_str(response_headers, CONTENT_LENGTH).and_then(|s| s.parse::<u64>().ok());
            let content_type = header_str(response_headers, CONTENT_TYPE).map(str::to_string);
            let headers = response_headers
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();

            Ok(TransportResponse {
                status: response.status().as_u16(),
                headers,
                content_length,
                content_type,
                body: Box::pin(response.bytes_stream()),
            })
        }

        async fn head(&self, url: &str) -> std::result::Result<HeadInfo, Self::Error> {
            let response = self.client.head(url).send().await?.error_for_status()?;
            let headers = response.headers();

            Ok(HeadInfo {
                content_length: header_str(headers, CONTENT_LENGTH).and_then(|s| s.parse::<u64>().ok()),
                content_type: header_str(headers, CONTENT_TYPE).map(str::to_string),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
