//! Error types for spool-inventory

/// Result type for spool-inventory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the inventory service
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network-level failure: connect, timeout, TLS, body read
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The response body does not match the expected record shape
    #[error("Schema error from {url}: {message}")]
    Schema { url: String, message: String },

    /// The configured inventory URL cannot be used
    #[error("Invalid inventory URL: {url}")]
    InvalidUrl { url: String },
}

impl Error {
    /// Whether this error came from the transport rather than the payload.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Status { .. })
    }
}
