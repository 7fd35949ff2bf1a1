use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] postcard::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("store capacity exceeded: {needed} bytes needed, {available} available")]
    CapacityExceeded { needed: u64, available: u64 },
}

pub type Result<T> = std::result::Result<T, StoreError>;
