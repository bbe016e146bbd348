//! Configuration for the relay.
//!
//! CLI arguments and environment variables via clap. Everything is resolved
//! once into an immutable `RelayConfig` at startup; handlers never read the
//! process environment.

use std::net::SocketAddr;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;

use crate::error::RelayError;
use crate::rewrite::RewriteRule;

/// Same-origin relay for the admin dashboard backend
#[derive(Parser, Debug, Clone)]
#[command(name = "admin-relay")]
#[command(about = "Forwards same-origin /api-proxy calls to the admin backend")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Upstream base URL (scheme + host). Without it every forward fails
    /// with 500.
    #[arg(long, env = "API_BASE")]
    pub api_base: Option<String>,

    /// Skip upstream certificate validation. Removes transport security.
    #[arg(long, env = "RELAY_INSECURE_TLS", value_parser = BoolishValueParser::new())]
    pub insecure_tls: bool,

    /// Hosting platform marker; enables the /api rewrite rule
    #[arg(long, env = "VERCEL", value_parser = BoolishValueParser::new())]
    pub hosted: bool,

    /// Path prefix of the relay endpoint
    #[arg(long, env = "RELAY_PREFIX", default_value = "/api-proxy")]
    pub relay_prefix: String,

    /// Public API prefix rewritten onto the relay when hosted
    #[arg(long, env = "PUBLIC_API_PREFIX", default_value = "/api")]
    pub public_api_prefix: String,

    /// Upstream timeout in milliseconds, 0 for none
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value = "30000")]
    pub upstream_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn validate(&self) -> Result<(), RelayError> {
        validate_prefix("relay prefix", &self.relay_prefix)?;
        validate_prefix("public API prefix", &self.public_api_prefix)?;
        if let Some(base) = self.base_url() {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(RelayError::Config(format!(
                    "API_BASE must start with http:// or https://, got {base}"
                )));
            }
        }
        Ok(())
    }

    /// Base URL with surrounding whitespace and trailing slashes removed;
    /// empty counts as unset.
    pub fn base_url(&self) -> Option<String> {
        self.api_base.as_deref().and_then(normalize_base_url)
    }

    pub fn relay_config(&self) -> RelayConfig {
        let rewrite = self
            .hosted
            .then(|| RewriteRule::public_api(&self.public_api_prefix, &self.relay_prefix));
        RelayConfig {
            upstream: UpstreamTarget {
                base_url: self.base_url(),
                insecure_tls: self.insecure_tls,
            },
            relay_prefix: self.relay_prefix.clone(),
            rewrite,
            timeout: (self.upstream_timeout_ms > 0)
                .then(|| Duration::from_millis(self.upstream_timeout_ms)),
        }
    }
}

fn validate_prefix(what: &str, prefix: &str) -> Result<(), RelayError> {
    let malformed = !prefix.starts_with('/')
        || prefix.len() < 2
        || prefix.ends_with('/')
        || prefix.contains(&['{', '}', '?'][..]);
    if malformed {
        return Err(RelayError::Config(format!(
            "{what} must look like /segment, got {prefix:?}"
        )));
    }
    Ok(())
}

/// `base` without surrounding whitespace and trailing slashes; `None` when
/// nothing is left.
pub fn normalize_base_url(base: &str) -> Option<String> {
    let base = base.trim().trim_end_matches('/');
    (!base.is_empty()).then(|| base.to_string())
}

/// Where forwarded requests go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub base_url: Option<String>,
    pub insecure_tls: bool,
}

impl UpstreamTarget {
    /// The base URL a forward may use. Blank or slash-only values count as
    /// unset, whichever way the field was filled.
    pub fn base_url(&self) -> Result<&str, RelayError> {
        self.base_url
            .as_deref()
            .map(|b| b.trim().trim_end_matches('/'))
            .filter(|b| !b.is_empty())
            .ok_or(RelayError::MissingBaseUrl)
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub upstream: UpstreamTarget,
    pub relay_prefix: String,
    /// Present only under the hosting condition.
    pub rewrite: Option<RewriteRule>,
    pub timeout: Option<Duration>,
}

impl RelayConfig {
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            upstream: UpstreamTarget {
                base_url: base_url.and_then(normalize_base_url),
                insecure_tls: false,
            },
            relay_prefix: "/api-proxy".to_string(),
            rewrite: None,
            timeout: None,
        }
    }
}
