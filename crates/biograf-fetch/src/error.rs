use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("cannot determine length of {url}")]
    UnknownLength { url: String },

    #[error("expected {expected} bytes from {url}, got {actual}")]
    UnexpectedLength {
        url: String,
        expected: u64,
        actual: u64,
    },

    #[error("max retries exceeded ({count} attempts): {last}")]
    MaxRetriesExceeded { count: u32, last: Box<Error> },

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::HttpStatus { status, .. } => crate::core::is_retryable_status(*status),
            _ => false,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
