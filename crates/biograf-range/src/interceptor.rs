use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use http::header::RANGE;
use http::{HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use biograf_fetch::HttpClient;
use biograf_store::ChunkStore;

use crate::error::{RangeError, Result};
use crate::synth::{RangedResponder, Synthesized};

/// Routes requests to the cache or the network.
///
/// - Range requests for cached resources are synthesized from units
/// - Other `GET`s are served whole from the store when fully cached
/// - Everything else, including gaps and store failures, goes to the network
///   unchanged
pub struct Interceptor<S, C> {
    responder: RangedResponder<S>,
    client: C,
}

impl<S: ChunkStore, C: HttpClient> Interceptor<S, C> {
    pub fn new(responder: RangedResponder<S>, client: C) -> Self {
        Self { responder, client }
    }

    pub fn responder(&self) -> &RangedResponder<S> {
        &self.responder
    }

    pub async fn handle<B>(&self, request: &Request<B>) -> Result<Response<Bytes>> {
        if *request.method() == Method::GET {
            if let Some(response) = self.from_cache(request) {
                return Ok(response);
            }
        }
        self.network(request).await
    }

    fn from_cache<B>(&self, request: &Request<B>) -> Option<Response<Bytes>> {
        let uri = request.uri();

        if request.headers().contains_key(RANGE) {
            match self.responder.can_handle(request) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    warn!(%uri, error = %e, "cache lookup failed, using network");
                    return None;
                }
            }
            return match self.responder.create(request) {
                Ok(Synthesized::Response(response)) => Some(response),
                Ok(Synthesized::Gap) => {
                    debug!(%uri, "cached range has a gap, using network");
                    None
                }
                Err(e) => {
                    warn!(%uri, error = %e, "range synthesis failed, using network");
                    None
                }
            };
        }

        match self.responder.lookup(request) {
            Ok(response) => response,
            Err(e) => {
                warn!(%uri, error = %e, "cache lookup failed, using network");
                None
            }
        }
    }

    /// Forward the request as-is and buffer the response.
    async fn network<B>(&self, request: &Request<B>) -> Result<Response<Bytes>> {
        let headers: Vec<(String, String)> = request
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();

        let url = request.uri().to_string();
        debug!(%url, "fetching from network");
        let mut upstream = self
            .client
            .send(&url, &headers)
            .await
            .map_err(|e| RangeError::Network(e.to_string()))?;

        let mut body = BytesMut::new();
        while let Some(chunk) = upstream.body.next().await {
            body.extend_from_slice(&chunk.map_err(|e| RangeError::Network(e.to_string()))?);
        }

        let status = StatusCode::from_u16(upstream.status)
            .map_err(|e| RangeError::Network(e.to_string()))?;
        let mut builder = Response::builder().status(status);
        for (name, value) in &upstream.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                builder = builder.header(name, value);
            }
        }
        Ok(builder.body(body.freeze())?)
    }
}
