//! In-memory origin for tests.
//!
//! [`MockClient`] serves registered byte blobs, honors single `Range`
//! headers, and can be told to ignore ranges, fail transiently, hide
//! lengths, or hold requests until released.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::Notify;

use crate::effects::http::{HeadInfo, HttpClient, TransportResponse};

const BODY_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone)]
struct MockResource {
    bytes: Bytes,
    content_type: Option<String>,
    hide_length: bool,
}

#[derive(Debug, Default)]
struct Shared {
    resources: Mutex<HashMap<String, MockResource>>,
    requests: Mutex<Vec<(String, Option<String>)>>,
    heads: AtomicUsize,
    ignore_range: AtomicBool,
    failures: AtomicU32,
    hold: AtomicBool,
    hold_heads: AtomicBool,
    held: Notify,
    release: Notify,
}

/// Cloneable handle to an in-memory origin.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    shared: Arc<Shared>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` at `url`.
    pub fn insert(&self, url: &str, bytes: impl Into<Bytes>, content_type: Option<&str>) {
        lock(&self.shared.resources).insert(
            url.to_string(),
            MockResource {
                bytes: bytes.into(),
                content_type: content_type.map(str::to_string),
                hide_length: false,
            },
        );
    }

    /// Stop reporting `Content-Length` for `url`.
    pub fn hide_length(&self, url: &str) {
        if let Some(resource) = lock(&self.shared.resources).get_mut(url) {
            resource.hide_length = true;
        }
    }

    /// Answer every GET with the whole body and status 200.
    pub fn ignore_range(&self, ignore: bool) {
        self.shared.ignore_range.store(ignore, Ordering::SeqCst);
    }

    /// Answer the next `count` requests with 503.
    pub fn fail_next(&self, count: u32) {
        self.shared.failures.store(count, Ordering::SeqCst);
    }

    /// Make GETs wait for [`MockClient::release`] before answering.
    pub fn hold(&self, hold: bool) {
        self.shared.hold.store(hold, Ordering::SeqCst);
    }

    /// Make HEADs wait for [`MockClient::release`], pausing planning.
    pub fn hold_heads(&self, hold: bool) {
        self.shared.hold_heads.store(hold, Ordering::SeqCst);
    }

    /// Wait until a request is being held.
    pub async fn wait_held(&self) {
        self.shared.held.notified().await;
    }

    /// Let one held request proceed.
    pub fn release(&self) {
        self.shared.release.notify_one();
    }

    /// GET requests seen so far as `(url, range)`.
    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        lock(&self.shared.requests).clone()
    }

    pub fn head_count(&self) -> usize {
        self.shared.heads.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.shared
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn resource(&self, url: &str) -> Option<MockResource> {
        lock(&self.shared.resources).get(url).cloned()
    }
}

fn parse_range(value: &str, len: u64) -> Option<(u64, u64)> {
    let spec = value.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;
    let start: u64 = start.parse().ok()?;
    let end = if end.is_empty() {
        len.checked_sub(1)?
    } else {
        end.parse::<u64>().ok()?.min(len.checked_sub(1)?)
    };
    (start <= end).then_some((start, end + 1))
}

fn response(
    status: u16,
    body: Bytes,
    content_type: Option<String>,
    extra: Vec<(String, String)>,
) -> TransportResponse<io::Error> {
    let chunks: Vec<io::Result<Bytes>> = body
        .chunks(BODY_CHUNK)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    let mut headers = extra;
    headers.push(("content-length".to_string(), body.len().to_string()));
    if let Some(ct) = &content_type {
        headers.push(("content-type".to_string(), ct.clone()));
    }
    TransportResponse {
        status,
        headers,
        content_length: Some(body.len() as u64),
        content_type,
        body: Box::pin(futures_util::stream::iter(chunks)),
    }
}

impl HttpClient for MockClient {
    type Error = io::Error;

    async fn send(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<TransportResponse<Self::Error>, Self::Error> {
        let range = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("range"))
            .map(|(_, v)| v.clone());
        lock(&self.shared.requests).push((url.to_string(), range.clone()));

        if self.shared.hold.load(Ordering::SeqCst) {
            self.shared.held.notify_one();
            self.shared.release.notified().await;
        }

        if self.take_failure() {
            return Ok(response(503, Bytes::new(), None, Vec::new()));
        }
        let Some(resource) = self.resource(url) else {
            return Ok(response(404, Bytes::new(), None, Vec::new()));
        };

        let len = resource.bytes.len() as u64;
        match range {
            Some(value) if !self.shared.ignore_range.load(Ordering::SeqCst) => {
                match parse_range(&value, len) {
                    Some((start, end)) => Ok(response(
                        206,
                        resource.bytes.slice(start as usize..end as usize),
                        resource.content_type,
                        vec![(
                            "content-range".to_string(),
                            format!("bytes {}-{}/{len}", start, end - 1),
                        )],
                    )),
                    None => Ok(response(
                        416,
                        Bytes::new(),
                        None,
                        vec![("content-range".to_string(), format!("bytes */{len}"))],
                    )),
                }
            }
            _ => Ok(response(
                200,
                resource.bytes,
                resource.content_type,
                Vec::new(),
            )),
        }
    }

    async fn head(&self, url: &str) -> Result<HeadInfo, Self::Error> {
        self.shared.heads.fetch_add(1, Ordering::SeqCst);
        if self.shared.hold_heads.load(Ordering::SeqCst) {
            self.shared.held.notify_one();
            self.shared.release.notified().await;
        }
        if self.take_failure() {
            return Err(io::Error::other("service unavailable"));
        }
        match self.resource(url) {
            Some(resource) => Ok(HeadInfo {
                content_length: (!resource.hide_length).then_some(resource.bytes.len() as u64),
                content_type: resource.content_type,
            }),
            None => Err(io::Error::new(io::ErrorKind::NotFound, format!("no resource at {url}"))),
        }
    }
}
