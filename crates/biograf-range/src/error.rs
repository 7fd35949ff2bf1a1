use biograf_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RangeError {
    #[error("malformed range header: {0:?}")]
    Malformed(String),

    #[error("range {range:?} not satisfiable for {length} bytes")]
    NotSatisfiable { range: String, length: u64 },

    #[error("network request failed: {0}")]
    Network(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Http(#[from] http::Error),
}

impl RangeError {
    /// Whether the error should be answered with `416 Range Not Satisfiable`.
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, RangeError::Malformed(_) | RangeError::NotSatisfiable { .. })
    }
}

pub type Result<T> = std::result::Result<T, RangeError>;
