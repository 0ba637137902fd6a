use thiserror::Error;

/// Failures that end a request inside the pipeline.
///
/// Route misses are not represented here: an unmatched path is an ordinary
/// control path that ends at the not-found fallback handler.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Decoded body would exceed the configured limit (maps to HTTP 413)
    #[error("request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    /// JSON body could not be parsed, or is not an object (maps to HTTP 400)
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// Body bytes are not valid for the declared content type (maps to HTTP 400)
    #[error("unreadable request body: {0}")]
    UnsupportedBody(String),

    /// Anything a mounted handler lets escape (maps to HTTP 500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Wrap any displayable failure as an unhandled handler failure.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Errors from the persistence connection attempt made at startup.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No database URL was configured
    #[error("no database URL configured")]
    NotConfigured,

    /// The configured URL cannot be used to reach a host
    #[error("invalid database URL: {0}")]
    InvalidUrl(String),

    /// Network or connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// The connection attempt did not complete in time
    #[error("connection to {addr} timed out after {seconds}s")]
    Timeout { addr: String, seconds: u64 },
}
