//! Deployment rewrite rule.
//!
//! Under the hosting condition, `/api/:path*` is served by the relay as
//! `/api-proxy/api/:path*`. The rewrite happens before routing, so the
//! handler sees the rewritten URI.

use axum::extract::Request;
use axum::http::Uri;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    source: String,
    destination: String,
}

impl RewriteRule {
    pub fn new(source: &str, destination: &str) -> Self {
        Self {
            source: source.trim_end_matches('/').to_string(),
            destination: destination.trim_end_matches('/').to_string(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// `<public>/:path*` -> `<relay><public>/:path*`
    pub fn public_api(public_prefix: &str, relay_prefix: &str) -> Self {
        let public_prefix = public_prefix.trim_end_matches('/');
        Self::new(
            public_prefix,
            &format!("{}{public_prefix}", relay_prefix.trim_end_matches('/')),
        )
    }

    /// Rewritten path, or `None` when the rule does not match. Matches the
    /// source prefix itself and anything below it, never a longer sibling
    /// like `/apis`.
    pub fn rewrite_path(&self, path: &str) -> Option<String> {
        let rest = path.strip_prefix(&self.source)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(format!("{}{rest}", self.destination))
        } else {
            None
        }
    }

    pub fn rewrite_uri(&self, uri: &Uri) -> Option<Uri> {
        let path = self.rewrite_path(uri.path())?;
        let path_and_query = match uri.query() {
            Some(q) => format!("{path}?{q}"),
            None => path,
        };
        let mut parts = uri.clone().into_parts();
        parts.path_and_query = Some(path_and_query.parse().ok()?);
        Uri::from_parts(parts).ok()
    }

    pub fn apply(&self, mut req: Request) -> Request {
        if let Some(uri) = self.rewrite_uri(req.uri()) {
            tracing::trace!(from = %req.uri(), to = %uri, "rewrite");
            *req.uri_mut() = uri;
        }
        req
    }
}
