//! Client error handling
//!
//! This module provides the typed failures the sync layer can surface.
//! The engine never retries on its own: every failure is returned once to
//! the caller, which decides user-facing behavior. `Unauthorized` is kept
//! distinct from other rejections so the caller can start a reauthentication
//! flow instead of retrying a request that can only fail again.

use thiserror::Error;

/// Failures surfaced by the sync controller and record store
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Session expired or missing credentials")]
    Unauthorized,

    /// Non-2xx response with a structured message; the message is shown
    /// to the user verbatim
    #[error("Server rejected request ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// True when the caller should reauthenticate rather than retry
    pub fn needs_reauthentication(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
