//! Relay Error Types
//!
//! Every failure becomes an HTTP answer: a missing upstream is a 500,
//! anything that goes wrong while forwarding is a 502.

use thiserror::Error;

use super::event::RelayResponse;
use super::forwarder::ForwardError;

/// Relay error types
#[derive(Error, Debug)]
pub enum RelayError {
    /// No upstream configured
    #[error("BACKEND_URL not set")]
    MissingBackendUrl,

    /// Upstream base URL or rewritten target could not be parsed
    #[error("invalid backend url {url}: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    /// Inbound body flagged as base64 but not decodable
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] base64::DecodeError),

    /// Transport failure while talking to upstream
    #[error("{0}")]
    Forward(#[from] ForwardError),
}

impl RelayError {
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::MissingBackendUrl => 500,
            _ => 502,
        }
    }
}

impl From<RelayError> for RelayResponse {
    fn from(err: RelayError) -> Self {
        let body = match &err {
            RelayError::MissingBackendUrl => err.to_string(),
            _ => format!("proxy error: {}", err),
        };
        RelayResponse::text(err.status_code(), body)
    }
}

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
