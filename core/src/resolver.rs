//! Maps a logical API path to a concrete request target.
//!
//! # Design
//! The routing decision depends only on the `EnvironmentContext`, so it is
//! taken once in `ApiResolver::new` and reused for every path. Rules, first
//! match wins:
//!
//! 1. force-relay (explicit flag, or the hosting-platform flag) -> relay
//! 2. browser page served from a hosted-platform domain -> relay
//! 3. base URL configured -> direct
//! 4. otherwise -> relay
//!
//! No I/O happens here; identical inputs always give identical targets.

use crate::env::{EnvironmentContext, Runtime};

/// Path prefix under which the relay endpoint is mounted.
pub const DEFAULT_RELAY_PREFIX: &str = "/api-proxy";

/// Origin hosts ending in this suffix are served by the hosting platform.
pub const HOSTED_DOMAIN_SUFFIX: &str = ".vercel.app";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Same-origin relay path.
    Relay,
    /// Direct call to the upstream base URL.
    Direct(String),
}

/// Decide how the backend is reached for this context.
pub fn decide_route(ctx: &EnvironmentContext) -> Route {
    if ctx.force_relay || ctx.hosted_platform {
        return Route::Relay;
    }
    if let Runtime::Browser { origin_host } = &ctx.runtime {
        if is_hosted_origin(origin_host) {
            return Route::Relay;
        }
    }
    match &ctx.base_url {
        Some(base) => Route::Direct(base.clone()),
        None => Route::Relay,
    }
}

pub fn is_hosted_origin(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    host.ends_with(HOSTED_DOMAIN_SUFFIX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResolver {
    route: Route,
    relay_prefix: String,
}

impl ApiResolver {
    pub fn new(ctx: &EnvironmentContext) -> Self {
        Self::with_relay_prefix(ctx, DEFAULT_RELAY_PREFIX)
    }

    pub fn with_relay_prefix(ctx: &EnvironmentContext, relay_prefix: &str) -> Self {
        Self {
            route: decide_route(ctx),
            relay_prefix: relay_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Concrete target for `path`. A missing leading slash is added.
    pub fn resolve(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        match &self.route {
            Route::Relay => format!("{}{path}", self.relay_prefix),
            Route::Direct(base) => format!("{base}{path}"),
        }
    }
}
