//! Relay errors and their HTTP status codes.
//!
//! Every failure the relay itself produces is answered as plain text with a
//! fixed status. Upstream non-2xx answers are not errors here; they are
//! relayed as received.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("missing configuration: API_BASE is not set")]
    MissingBaseUrl,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid relay target: {0}")]
    InvalidTarget(String),

    #[error("upstream sent no response within {} ms", .0.as_millis())]
    UpstreamTimeout(Duration),

    #[error("upstream unreachable: {0}")]
    Upstream(reqwest::Error),

    #[error("failed to build upstream client: {0}")]
    ClientBuild(reqwest::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingBaseUrl
            | RelayError::Config(_)
            | RelayError::ClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
