//! Cache configuration.
//!
//! Every field has a default, so a `biograf.toml` only needs the keys it
//! changes:
//!
//! ```toml
//! origin = "https://media.example.com/"
//! capacity = 2147483648
//! prefetch-enabled = false
//! ```

use std::path::Path;

use biograf_fetch::{CHUNK_SIZE, ManifestRef};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A file of an asset, either stored under its own name or renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetFile {
    Path(String),
    Renamed { src: String, dest: String },
}

impl From<&AssetFile> for ManifestRef {
    fn from(file: &AssetFile) -> Self {
        match file {
            AssetFile::Path(path) => ManifestRef::new(path.clone()),
            AssetFile::Renamed { src, dest } => ManifestRef::renamed(src.clone(), dest.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OfflineConfig {
    /// Base URL asset roots are resolved against.
    pub origin: String,
    /// Manifest name appended to an asset root to form a prefetch path.
    pub prefetch_manifest: String,
    /// Default number of bytes a prefetch warms per resource.
    pub prefetch_buffer_goal: u64,
    pub prefetch_enabled: bool,
    /// Files warmed by a prefetch.
    pub prefetch_files: Vec<AssetFile>,
    /// Artwork and manifest stored with every offline copy.
    pub offline_assets: Vec<AssetFile>,
    /// Media renditions stored with every offline copy.
    pub offline_renditions: Vec<AssetFile>,
    /// Store size limit in bytes. `None` is unbounded.
    pub capacity: Option<u64>,
    /// Retries per unit on transient network failures.
    pub max_retries: u32,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        let path = |p: &str| AssetFile::Path(p.to_string());
        Self {
            origin: "http://localhost:8080/".to_string(),
            prefetch_manifest: "mp4/dash.mpd".to_string(),
            prefetch_buffer_goal: 4 * CHUNK_SIZE,
            prefetch_enabled: true,
            prefetch_files: vec![
                path("mp4/dash.mpd"),
                path("mp4/v-0480p-1000k-libx264.mp4"),
                path("mp4/a-eng-0128k-aac.mp4"),
            ],
            offline_assets: vec![
                path("artwork@256.jpg"),
                path("artwork@512.jpg"),
                path("poster-small.jpg"),
                path("poster.jpg"),
                AssetFile::Renamed {
                    src: "mp4/offline-720p.mpd".to_string(),
                    dest: "mp4/dash.mpd".to_string(),
                },
            ],
            offline_renditions: vec![
                path("mp4/v-0720p-2500k-libx264.mp4"),
                path("mp4/a-eng-0128k-aac.mp4"),
            ],
            capacity: None,
            max_retries: 3,
        }
    }
}

impl OfflineConfig {
    /// Read a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// References downloaded by "add offline".
    pub fn offline_refs(&self) -> Vec<ManifestRef> {
        self.offline_assets
            .iter()
            .chain(&self.offline_renditions)
            .map(ManifestRef::from)
            .collect()
    }

    pub fn prefetch_refs(&self) -> Vec<ManifestRef> {
        self.prefetch_files.iter().map(ManifestRef::from).collect()
    }

    /// Asset root of a composite prefetch path, if it names the prefetch manifest.
    pub fn prefetch_root<'a>(&self, composite: &'a str) -> Option<&'a str> {
        let composite = composite.trim_matches('/');
        let manifest = self.prefetch_manifest.trim_matches('/');
        composite
            .strip_suffix(manifest)?
            .strip_suffix('/')
            .filter(|root| !root.is_empty())
    }

    /// Composite prefetch path of an asset root.
    pub fn prefetch_path(&self, root: &str) -> String {
        format!(
            "{}/{}",
            root.trim_matches('/'),
            self.prefetch_manifest.trim_matches('/')
        )
    }
}
