//! Ranged HTTP fetching and segment planning for offline media assets.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and request descriptions
//! - [`core`] - Pure transformations (chunking, retry delays, status checks)
//! - [`effects`] - I/O operations behind the [`HttpClient`] abstraction
//!
//! # Key Features
//!
//! - **Bounded Units**: Resources are planned as fixed-size byte ranges so at
//!   most one chunk buffer is live per download
//! - **Range Tolerance**: Origins that ignore `Range` still yield the exact
//!   slice that was asked for
//! - **Mechanism-Only**: No progress UI or cancellation policy; the caller
//!   drives the unit loop

pub mod core;
pub mod data;
pub mod effects;
mod error;
#[cfg(feature = "mock")]
pub mod mock;

pub use crate::core::{CHUNK_SIZE, Segment, chunk_segments, guess_content_type, retry_delay};
pub use data::{FetchOptions, ManifestRef};
pub use effects::{
    BoxStream, Fetcher, HeadInfo, HttpClient, PlannedResource, SegmentPlanner, TransportResponse,
    planned_bytes,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{Error, Result};
