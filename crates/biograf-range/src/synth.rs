use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use http::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use http::{Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use tracing::{debug, trace};

use biograf_store::{ByteSpan, ChunkStore, KeyPrefix, Tier, UnitKey, covers, resource_path};

use crate::error::Result;
use crate::range::{ByteRange, unsatisfied_range};

/// Tiers in the order they are consulted.
const TIERS: [Tier; 2] = [Tier::Offline, Tier::Prefetch];

/// Result of synthesizing a ranged response.
#[derive(Debug)]
pub enum Synthesized {
    /// A `206` with the requested bytes, or a `416` for an unsatisfiable range.
    Response(Response<Bytes>),
    /// The store does not hold every requested byte.
    Gap,
}

/// Units of one resource in one tier.
struct Holdings {
    tier: Tier,
    keys: Vec<UnitKey>,
    length: u64,
    content_type: Option<String>,
}

/// Answers range requests from cached units without touching the network.
///
/// Never writes to the store.
pub struct RangedResponder<S> {
    store: Arc<S>,
    mount: String,
}

impl<S: ChunkStore> RangedResponder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            mount: String::new(),
        }
    }

    /// Strip `mount` from request paths before looking them up.
    #[must_use]
    pub fn with_mount(mut self, mount: &str) -> Self {
        self.mount = decode_path(mount);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Logical resource path a request refers to, percent-decoded.
    pub fn resource_path<B>(&self, request: &Request<B>) -> String {
        let path = decode_path(request.uri().path());
        if self.mount.is_empty() {
            return path;
        }
        match path.strip_prefix(&self.mount) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => resource_path(rest),
            _ => path,
        }
    }

    /// Whether the request carries a `Range` header and any unit of its
    /// resource is cached.
    pub fn can_handle<B>(&self, request: &Request<B>) -> Result<bool> {
        if !request.headers().contains_key(RANGE) {
            return Ok(false);
        }
        let path = self.resource_path(request);
        for tier in TIERS {
            if !self.store.keys(&KeyPrefix::resource(tier, &path))?.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Build a partial response for the request's range from cached units.
    ///
    /// The offline tier is preferred; the prefetch tier is used when it alone
    /// covers the range. Unparsable or out-of-bounds ranges produce a `416`.
    pub fn create<B>(&self, request: &Request<B>) -> Result<Synthesized> {
        let path = self.resource_path(request);
        let holdings = self.holdings(&path)?;
        let Some(first) = holdings.first() else {
            return Ok(Synthesized::Gap);
        };

        let header = request
            .headers()
            .get(RANGE)
            .map(|v| v.to_str().map(str::to_string).unwrap_or_default())
            .unwrap_or_default();
        let resolved = match ByteRange::parse(&header).and_then(|r| r.resolve(first.length)) {
            Ok(resolved) => resolved,
            Err(e) if e.is_unsatisfiable() => {
                debug!(%path, error = %e, "range not satisfiable");
                return Ok(Synthesized::Response(not_satisfiable(first.length)?));
            }
            Err(e) => return Err(e),
        };

        for holding in &holdings {
            if holding.length != resolved.length {
                continue;
            }
            if let Some(body) = self.assemble(holding, resolved.span())? {
                trace!(%path, tier = %holding.tier, range = %resolved.content_range(), "synthesized");
                let mut builder = Response::builder()
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(CONTENT_RANGE, resolved.content_range())
                    .header(CONTENT_LENGTH, resolved.len())
                    .header(ACCEPT_RANGES, "bytes");
                if let Some(content_type) = &holding.content_type {
                    builder = builder.header(CONTENT_TYPE, content_type);
                }
                return Ok(Synthesized::Response(builder.body(body)?));
            }
        }

        debug!(%path, range = %resolved.content_range(), "range not fully cached");
        Ok(Synthesized::Gap)
    }

    /// A `200` with the whole resource, if some tier holds all of it.
    pub fn lookup<B>(&self, request: &Request<B>) -> Result<Option<Response<Bytes>>> {
        let path = self.resource_path(request);
        for holding in self.holdings(&path)? {
            if let Some(body) = self.assemble(&holding, ByteSpan::new(0, holding.length))? {
                let mut builder = Response::builder()
                    .status(StatusCode::OK)
                    .header(CONTENT_LENGTH, holding.length)
                    .header(ACCEPT_RANGES, "bytes");
                if let Some(content_type) = &holding.content_type {
                    builder = builder.header(CONTENT_TYPE, content_type);
                }
                return Ok(Some(builder.body(body)?));
            }
        }
        Ok(None)
    }

    fn holdings(&self, path: &str) -> Result<Vec<Holdings>> {
        let mut holdings = Vec::new();
        for tier in TIERS {
            let keys = self.store.keys(&KeyPrefix::resource(tier, path))?;
            let Some(first) = keys.first() else {
                continue;
            };
            let Some(unit) = self.store.get(first)? else {
                continue;
            };
            holdings.push(Holdings {
                tier,
                length: unit.meta.total_length,
                content_type: unit.meta.content_type,
                keys,
            });
        }
        Ok(holdings)
    }

    /// Concatenate the slices of `holding` that fall in `wanted`, or `None`
    /// if any byte is missing.
    fn assemble(&self, holding: &Holdings, wanted: ByteSpan) -> Result<Option<Bytes>> {
        let keys: Vec<&UnitKey> = holding
            .keys
            .iter()
            .filter(|key| key.span.intersect(&wanted).is_some())
            .collect();
        let spans: Vec<ByteSpan> = keys.iter().map(|key| key.span).collect();
        if !covers(&spans, wanted) {
            return Ok(None);
        }

        let mut body = BytesMut::with_capacity(wanted.len() as usize);
        let mut pos = wanted.start;
        for key in keys {
            if pos >= wanted.end {
                break;
            }
            if key.span.end <= pos {
                continue;
            }
            // Removed since the key scan.
            let Some(unit) = self.store.get(key)? else {
                return Ok(None);
            };
            let from = (pos - key.span.start) as usize;
            let to = (wanted.end.min(key.span.end) - key.span.start) as usize;
            let Some(slice) = unit.bytes.get(from..to) else {
                return Ok(None);
            };
            body.extend_from_slice(slice);
            pos = key.span.start + to as u64;
        }

        if body.len() as u64 != wanted.len() {
            return Ok(None);
        }
        Ok(Some(body.freeze()))
    }
}

/// `416` response for a resource of `length` bytes.
pub fn not_satisfiable(length: u64) -> Result<Response<Bytes>> {
    Ok(Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_RANGE, unsatisfied_range(length))
        .header(CONTENT_LENGTH, 0)
        .body(Bytes::new())?)
}

/// Store keys hold decoded paths; request URIs carry them percent-encoded.
fn decode_path(raw: &str) -> String {
    percent_decode_str(&resource_path(raw))
        .decode_utf8_lossy()
        .into_owned()
}
