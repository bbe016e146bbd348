//! Environment context for API resolution.
//!
//! # Design
//! All the inputs that decide how the backend is reached (runtime, base URL,
//! force-relay flag, hosting flag) are gathered once into an
//! `EnvironmentContext`. Nothing downstream reads process environment at call
//! time; the context is built at startup and injected.

use std::env;

/// Environment variable holding the upstream base URL.
pub const API_BASE_VAR: &str = "API_BASE";
/// Environment variable forcing every call through the relay.
pub const FORCE_RELAY_VAR: &str = "FORCE_RELAY";
/// Set to `1` by the hosting platform.
pub const HOSTED_PLATFORM_VAR: &str = "VERCEL";

/// Where the calling code runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Runtime {
    Server,
    /// A browser page served from `origin_host` (hostname, no port).
    Browser { origin_host: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentContext {
    pub runtime: Runtime,
    /// Upstream base URL without trailing slash. `None` when unset or empty.
    pub base_url: Option<String>,
    pub force_relay: bool,
    pub hosted_platform: bool,
}

impl EnvironmentContext {
    pub fn new(runtime: Runtime, base_url: Option<&str>, force_relay: bool, hosted_platform: bool) -> Self {
        Self {
            runtime,
            base_url: base_url.and_then(normalize_base_url),
            force_relay,
            hosted_platform,
        }
    }

    /// Read the context from process environment for the given runtime.
    pub fn from_env(runtime: Runtime) -> Self {
        let base = env::var(API_BASE_VAR).ok();
        Self::new(
            runtime,
            base.as_deref(),
            flag(FORCE_RELAY_VAR),
            flag(HOSTED_PLATFORM_VAR),
        )
    }
}

/// Trim whitespace and trailing slashes; empty means unset.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn flag(name: &str) -> bool {
    env::var(name).map(|v| parse_flag(&v)).unwrap_or(false)
}

pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
