//! Effect layer - I/O operations.
//!
//! This module contains all the side-effecting operations including
//! HTTP requests and the HEAD probes used for planning.

pub mod fetcher;
pub mod http;
pub mod plan;

pub use fetcher::Fetcher;
pub use http::{BoxStream, HeadInfo, HttpClient, TransportResponse};
pub use plan::{PlannedResource, SegmentPlanner, planned_bytes};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
