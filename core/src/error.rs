//! Error types for the employee API client.
//!
//! # Design
//! `Display` renders the message a user should see. The store writes
//! `err.to_string()` into its last-error slot and into error notices, so the
//! variants carry already-resolved messages rather than raw response bodies.

use thiserror::Error;

/// Errors produced while building, executing, or parsing employee requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No bearer credential was available.
    #[error("{0}")]
    Unauthorized(String),

    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-2xx status. `message` is the message
    /// selected from the error body, or the operation's fallback.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// A 2xx body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The payload failed client-side validation before any request was built.
    #[error("{0}")]
    Validation(String),

    /// Image compression failed. Recoverable: callers fall back to the
    /// original file.
    #[error("image compression failed: {0}")]
    Compression(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
