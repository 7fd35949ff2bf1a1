use biograf_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OfflineError {
    /// A resource of the asset has no determinable length.
    #[error("cannot resolve asset {asset}")]
    Resolution {
        asset: String,
        #[source]
        source: biograf_fetch::Error,
    },

    #[error("asset {asset} is already being downloaded")]
    AlreadyInProgress { asset: String },

    #[error("asset {asset} has an active {kind} job")]
    JobActive { asset: String, kind: crate::JobKind },

    #[error("failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: biograf_fetch::Error,
    },

    #[error("download of {asset} was cancelled")]
    Cancelled { asset: String },

    #[error(transparent)]
    StoreIo(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, OfflineError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
