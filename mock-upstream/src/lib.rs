use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Token accepted by the protected endpoints of `app()`.
pub const TEST_TOKEN: &str = "test-token";
/// Password accepted by the login endpoint.
pub const TEST_PASSWORD: &str = "secret";

/// Number of chunks `/drip` sends.
pub const DRIP_CHUNKS: u8 = 5;
/// Pause between two `/drip` chunks.
pub const DRIP_INTERVAL: Duration = Duration::from_millis(150);

/// What `/echo` saw of the request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Upstream {
    pub token: Arc<str>,
}

pub fn app() -> Router {
    app_with_token(TEST_TOKEN)
}

pub fn app_with_token(token: &str) -> Router {
    let state = Upstream {
        token: Arc::from(token),
    };
    Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/status/{code}", any(status))
        .route("/plain", get(plain))
        .route("/encoded", get(encoded))
        .route("/redirect", get(redirect))
        .route("/slow", get(slow))
        .route("/drip", get(drip))
        .route("/api/auth/login", post(login))
        .route("/api/wallet/balance", get(balance))
        .route("/api/admin/reward-codes", get(reward_codes))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Answers with `code` and its lowercase reason phrase as a text body.
async fn status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    let reason = status.canonical_reason().unwrap_or("unknown").to_lowercase();
    (status, reason).into_response()
}

async fn plain() -> &'static str {
    "hello"
}

async fn encoded() -> Response {
    (
        [
            (header::CONTENT_ENCODING, "identity"),
            (header::CONTENT_TYPE, "text/plain"),
        ],
        "identity body",
    )
        .into_response()
}

async fn redirect() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/echo/redirected")]).into_response()
}

/// Never answers within any sane client timeout.
async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(30)).await;
    "too late"
}

/// Headers at once, then `DRIP_CHUNKS` chunks `chunk<n>;` spaced by
/// `DRIP_INTERVAL`.
async fn drip() -> Response {
    let chunks = futures_util::stream::unfold(0u8, |n| async move {
        if n == DRIP_CHUNKS {
            return None;
        }
        if n > 0 {
            tokio::time::sleep(DRIP_INTERVAL).await;
        }
        let chunk = Bytes::from(format!("chunk{n};"));
        Some((Ok::<_, std::convert::Infallible>(chunk), n + 1))
    });
    Body::from_stream(chunks).into_response()
}

async fn login(State(state): State<Upstream>, Json(input): Json<Login>) -> Response {
    if input.username.is_empty() || input.password != TEST_PASSWORD {
        return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
    }
    Json(serde_json::json!({ "token": &*state.token })).into_response()
}

fn authorized(state: &Upstream, headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|t| t == &*state.token)
}

async fn balance(State(state): State<Upstream>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }
    Json(serde_json::json!({ "balance": 500 })).into_response()
}

async fn reward_codes(
    State(state): State<Upstream>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if !authorized(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }
    let redeemed = uri.query().is_some_and(|q| q.contains("redeemed=true"));
    Json(serde_json::json!([{
        "id": "rc-1",
        "code": "WELCOME",
        "amount": 1000,
        "isRedeemed": redeemed,
    }]))
    .into_response()
}
