//! Error types for the note service client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the note does not exist" from "the server returned an unexpected status."
//! All other non-200 responses land in `Http` with the raw status code and the
//! status line. Network failures have no response at all, so `Transport`
//! carries no status.

use thiserror::Error;

/// Errors returned by `NoteClient` parse methods and `Session` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Login was answered with a non-200 status.
    #[error("authentication failed: {message}")]
    Auth { status: u16, message: String },

    /// The server returned 404.
    #[error("404 Not Found")]
    NotFound,

    /// The server returned a non-200 status other than 404.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A 200 response body could not be decoded into the expected type.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the remote service produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth { status, .. } | ApiError::Http { status, .. } => Some(*status),
            ApiError::NotFound => Some(404),
            ApiError::Transport(_) | ApiError::Decode(_) | ApiError::Serialization(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }
}
