//! The request forwarder.
//!
//! Byte-transparent relay: method, raw path, query, headers and body go to
//! the upstream; status, headers and the body stream come back. Only the
//! headers listed below are dropped in each direction. Request bodies are
//! streamed upstream as they arrive, never buffered whole.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, Method},
    response::Response,
};
use tracing::{debug, warn};

use crate::error::RelayError;
use crate::AppState;

/// Dropped before the request goes upstream.
pub const STRIPPED_REQUEST_HEADERS: [HeaderName; 4] = [
    header::HOST,
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::ACCEPT_ENCODING,
];

/// Dropped from the upstream response; the server re-applies its own
/// framing and the body is relayed as received.
pub const STRIPPED_RESPONSE_HEADERS: [HeaderName; 2] =
    [header::CONTENT_ENCODING, header::TRANSFER_ENCODING];

pub fn forwards_body(method: &Method) -> bool {
    !(method == Method::GET || method == Method::HEAD)
}

pub fn sanitize_request_headers(headers: &HeaderMap) -> HeaderMap {
    strip(headers, &STRIPPED_REQUEST_HEADERS)
}

pub fn sanitize_response_headers(headers: &HeaderMap) -> HeaderMap {
    strip(headers, &STRIPPED_RESPONSE_HEADERS)
}

fn strip(headers: &HeaderMap, names: &[HeaderName]) -> HeaderMap {
    let mut out = headers.clone();
    for name in names {
        out.remove(name);
    }
    out
}

/// Part of a raw request path below `prefix`, starting with `/`.
pub fn relayed_path<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    rest.starts_with('/').then_some(rest)
}

/// `<base><rest>[?query]`, with `rest` and `query` kept verbatim.
pub fn upstream_url(base: &str, rest: &str, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{base}{rest}?{q}"),
        None => format!("{base}{rest}"),
    }
}

pub async fn forward(State(state): State<AppState>, req: Request) -> Result<Response, RelayError> {
    let base = state.config.upstream.base_url().inspect_err(|_| {
        warn!("rejecting forward: API_BASE is not configured");
    })?;

    let (parts, body) = req.into_parts();
    let rest = relayed_path(parts.uri.path(), &state.config.relay_prefix)
        .ok_or_else(|| RelayError::InvalidTarget(parts.uri.path().to_string()))?;
    let target = upstream_url(base, rest, parts.uri.query());

    let mut outbound = state
        .transport
        .client()
        .request(parts.method.clone(), &target)
        .headers(sanitize_request_headers(&parts.headers));
    if forwards_body(&parts.method) {
        outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    debug!(method = %parts.method, %target, "forwarding");
    // Only the wait for status and headers is bounded. Once they arrive the
    // body streams for as long as the upstream keeps sending.
    let pending = outbound.send();
    let sent = match state.config.timeout {
        Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
            warn!(method = %parts.method, %target, "upstream timed out after {limit:?}");
            RelayError::UpstreamTimeout(limit)
        })?,
        None => pending.await,
    };
    let upstream = sent.map_err(|e| {
        warn!(method = %parts.method, %target, "upstream call failed: {e}");
        RelayError::Upstream(e)
    })?;

    let status = upstream.status();
    let headers = sanitize_response_headers(upstream.headers());
    debug!(%status, %target, "relaying response");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
