//! Offline content cache for streaming media assets.
//!
//! [`OfflineCache`] resolves an asset's files into fixed-size units, fetches
//! them one at a time and writes them to a [`biograf_store::ChunkStore`].
//! Two tiers share the store:
//!
//! - **offline**: full copies the user asked for, reported by [`OfflineCache::has`]
//! - **prefetch**: the first few units of popular episodes, warmed silently
//!
//! At most one job (add, prefetch or remove) runs per asset. Jobs cancel
//! cooperatively between units and delete what they stored when they do not
//! complete, so an asset is never reported as partially available.

mod cache;
mod config;
mod error;
mod library;
mod registry;
mod state;

pub use cache::{AddCallbacks, CompleteFn, OfflineCache, ProgressFn};
pub use config::{AssetFile, OfflineConfig};
pub use error::{ConfigError, OfflineError, Result};
pub use library::{Episode, Library, Show};
pub use registry::{JobGuard, JobKind, JobRegistry};
pub use state::{AssetState, DownloadState, Outcome};
