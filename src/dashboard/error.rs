//! Dashboard Error Types
//!
//! Backend call failures and the message chain used to describe a
//! non-2xx reply to the user.

use thiserror::Error;

use super::dto::ErrorBody;

/// Errors raised while calling the Backend API
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection, timeout or protocol failure
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Describe a failed reply: the server's `error`, else the status text,
/// else the generic message. Empty strings count as absent.
pub fn failure_message(body: Option<&ErrorBody>, status_text: &str, generic: &str) -> String {
    body.and_then(|b| b.error.as_deref())
        .filter(|error| !error.trim().is_empty())
        .or_else(|| Some(status_text).filter(|text| !text.trim().is_empty()))
        .unwrap_or(generic)
        .to_string()
}
