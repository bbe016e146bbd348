//! The outbound HTTP transport.
//!
//! Built exactly once at startup and shared by every forwarded request.
//! Certificate validation is on unless the configuration explicitly opts
//! out. Redirects are never followed: a 3xx from the upstream reaches the
//! caller unmodified. The client carries no overall request timeout, so a
//! response body may stream for as long as the upstream keeps sending; the
//! wait for response headers is bounded in `forward`.

use reqwest::{redirect, Client};
use tracing::warn;

use crate::error::RelayError;

#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    insecure: bool,
}

impl Transport {
    pub fn new(insecure: bool) -> Result<Self, RelayError> {
        let mut builder = Client::builder().redirect(redirect::Policy::none());
        if insecure {
            warn!("upstream certificate validation is DISABLED");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(RelayError::ClientBuild)?;
        Ok(Self { client, insecure })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn is_insecure(&self) -> bool {
        self.insecure
    }
}
