//! Error types for the admin API client.
//!
//! # Design
//! `Upstream` is the error envelope: the literal status and raw body of a
//! non-2xx response, never parsed. Callers that need the 401 policy check
//! `is_unauthorized` and hand the error to `AdminClient::handle_unauthorized`.

use thiserror::Error;

/// Message shown when an error carries no readable body.
pub const GENERIC_FAILURE: &str = "request failed";

/// Errors produced while building requests or normalizing responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The upstream (or the relay) answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The outbound call did not complete. Filled in by the executing host.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A successful body could not be decoded into the requested type.
    #[error("deserialization failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// The token could not be persisted after login.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Literal upstream status, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Text for the user: the raw body when present, otherwise a generic
    /// fallback.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Upstream { body, .. } if !body.trim().is_empty() => body.clone(),
            ApiError::Upstream { .. } => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Errors from persisting the bearer token.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("token store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
