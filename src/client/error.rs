// File: ./src/client/error.rs
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures talking to the ClickUp API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Transport failure or a non-success status without a ClickUp error body.
    #[error("request to {endpoint} failed: {message}")]
    Remote { endpoint: String, message: String },

    /// No response within the configured timeout.
    #[error("request to {endpoint} timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    /// ClickUp answered with an `{"err": ...}` body.
    #[error("ClickUp returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The body did not have the expected shape.
    #[error("malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    #[error("invalid API url: {0}")]
    InvalidUrl(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),
}

impl ApiError {
    pub fn remote(endpoint: &str, err: impl std::fmt::Display) -> Self {
        Self::Remote {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    pub fn malformed(endpoint: &str, err: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    /// True when ClickUp rejected the token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}
