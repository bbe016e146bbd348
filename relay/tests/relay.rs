//! Relay behavior against a live mock upstream.
//!
//! Each test binds mock-upstream on an ephemeral port, then drives the relay
//! router in-process with `oneshot`. The relay's outbound calls go over real
//! HTTP, or real TLS for the certificate tests.

use std::sync::Arc;
use std::time::Duration;

use admin_relay::{app, AppState, RelayConfig, RewriteRule};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use http_body_util::BodyExt;
use mock_upstream::{Echo, DRIP_INTERVAL, TEST_TOKEN};
use rustls::pki_types::PrivateKeyDer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tower::ServiceExt;

async fn spawn_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_upstream::run(listener));
    format!("http://{addr}")
}

fn state(config: RelayConfig) -> AppState {
    AppState::new(config).unwrap()
}

async fn send(state: AppState, req: Request<Body>) -> Response {
    app(state).oneshot(req).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_echo(response: Response) -> Echo {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// --- configuration ---

#[tokio::test]
async fn missing_base_url_is_fixed_500() {
    let resp = send(
        state(RelayConfig::new(None)),
        Request::builder()
            .uri("/api-proxy/api/auth/login")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(resp).await.contains("missing configuration"));
}

#[tokio::test]
async fn blank_base_url_is_fixed_500() {
    for base in ["", "/"] {
        let resp = send(
            state(RelayConfig::new(Some(base))),
            Request::builder()
                .uri("/api-proxy/x")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{base:?}");
        assert!(body_text(resp).await.contains("missing configuration"));
    }

    let mut config = RelayConfig::new(None);
    config.upstream.base_url = Some(String::new());
    let resp = send(
        state(config),
        Request::builder()
            .uri("/api-proxy/x")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// --- round trip ---

#[tokio::test]
async fn echo_round_trip_preserves_method_path_query_and_body() {
    let base = spawn_upstream().await;
    let payload = r#"{"username":"bob","amount":500,"note":"naïve ✓"}"#;
    let resp = send(
        state(RelayConfig::new(Some(&base))),
        Request::builder()
            .method("PUT")
            .uri("/api-proxy/echo/users/a%20b/x?page=2&search=a%20b&flag")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let echo = body_echo(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.path, "/echo/users/a%20b/x");
    assert_eq!(echo.query.as_deref(), Some("page=2&search=a%20b&flag"));
    assert_eq!(echo.body, payload);
    assert_eq!(echo.headers["content-type"], "application/json");
}

#[tokio::test]
async fn every_payload_method_forwards_body_verbatim() {
    let base = spawn_upstream().await;
    for method in ["POST", "PATCH", "DELETE", "OPTIONS"] {
        let resp = send(
            state(RelayConfig::new(Some(&base))),
            Request::builder()
                .method(method)
                .uri("/api-proxy/echo")
                .body(Body::from("raw\nbytes"))
                .unwrap(),
        )
        .await;
        let echo = body_echo(resp).await;
        assert_eq!(echo.method, method);
        assert_eq!(echo.body, "raw\nbytes", "{method}");
    }
}

#[tokio::test]
async fn streamed_request_body_arrives_whole() {
    let base = spawn_upstream().await;
    let chunks = ["part-1;", "part-2;", "part-3"].map(Ok::<_, std::io::Error>);
    let resp = send(
        state(RelayConfig::new(Some(&base))),
        Request::builder()
            .method("POST")
            .uri("/api-proxy/echo")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap(),
    )
    .await;

    let echo = body_echo(resp).await;
    assert_eq!(echo.body, "part-1;part-2;part-3");
}

#[tokio::test]
async fn get_body_is_dropped() {
    let base = spawn_upstream().await;
    let resp = send(
        state(RelayConfig::new(Some(&base))),
        Request::builder()
            .method("GET")
            .uri("/api-proxy/echo")
            .body(Body::from("should not arrive"))
            .unwrap(),
    )
    .await;

    let echo = body_echo(resp).await;
    assert_eq!(echo.method, "GET");
    assert!(echo.body.is_empty());
}

#[tokio::test]
async fn head_is_forwarded_without_body() {
    let base = spawn_upstream().await;
    let resp = send(
        state(RelayConfig::new(Some(&base))),
        Request::builder()
            .method("HEAD")
            .uri("/api-proxy/plain")
            .body(Body::from("ignored"))
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.is_empty());
}

// --- headers ---

#[tokio::test]
async fn hop_headers_are_stripped_and_the_rest_pass() {
    let base = spawn_upstream().await;
    let resp = send(
        state(RelayConfig::new(Some(&base))),
        Request::builder()
            .method("POST")
            .uri("/api-proxy/echo")
            .header(header::HOST, "dashboard.example")
            .header(header::ACCEPT_ENCODING, "gzip, br")
            .header(header::AUTHORIZATION, "Bearer abc")
            .header("X-Request-Id", "r-42")
            .body(Body::from("x"))
            .unwrap(),
    )
    .await;

    let echo = body_echo(resp).await;
    assert_ne!(echo.headers.get("host").map(String::as_str), Some("dashboard.example"));
    assert!(echo.headers.get("accept-encoding").is_none());
    assert_eq!(echo.headers["authorization"], "Bearer abc");
    assert_eq!(echo.headers["x-request-id"], "r-42");
}

#[tokio::test]
async fn encoding_headers_are_stripped_from_response() {
    let base = spawn_upstream().await;
    let resp = send(
        state(RelayConfig::new(Some(&base))),
        Request::builder()
            .uri("/api-proxy/encoded")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert!(resp.headers().get(header::CONTENT_ENCODING).is_none());
    assert!(resp.headers().get(header::TRANSFER_ENCODING).is_none());
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(body_text(resp).await, "identity body");
}

// --- upstream outcomes ---

#[tokio::test]
async fn upstream_error_passes_through_verbatim() {
    let base = spawn_upstream().await;
    let resp = send(
        state(RelayConfig::new(Some(&base))),
        Request::builder()
            .uri("/api-proxy/status/404")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(resp).await, "not found");
}

#[tokio::test]
async fn redirects_are_relayed_not_followed() {
    let base = spawn_upstream().await;
    let resp = send(
        state(RelayConfig::new(Some(&base))),
        Request::builder()
            .uri("/api-proxy/redirect")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[header::LOCATION], "/echo/redirected");
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let resp = send(
        state(RelayConfig::new(Some(&format!("http://{addr}")))),
        Request::builder()
            .uri("/api-proxy/echo")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert!(!body_text(resp).await.is_empty());
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let base = spawn_upstream().await;
    let mut config = RelayConfig::new(Some(&base));
    config.timeout = Some(Duration::from_millis(200));

    let resp = send(
        state(config),
        Request::builder()
            .uri("/api-proxy/slow")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn timeout_does_not_cut_a_streaming_body() {
    let base = spawn_upstream().await;
    let mut config = RelayConfig::new(Some(&base));
    // shorter than the whole drip, longer than the wait for headers
    config.timeout = Some(DRIP_INTERVAL * 2);

    let resp = send(
        state(config),
        Request::builder()
            .uri("/api-proxy/drip")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "chunk0;chunk1;chunk2;chunk3;chunk4;");
}

// --- transport ---

/// HTTPS upstream behind a freshly generated self-signed certificate. Every
/// request that completes the handshake gets `200 secure ok`.
async fn spawn_self_signed_upstream() -> String {
    let certified =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();
    let cert = certified.cert.der().clone();
    let key = PrivateKeyDer::Pkcs8(certified.key_pair.serialize_der().into());
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let tls = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(tls));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // fails when the client rejects the certificate
                let Ok(mut stream) = acceptor.accept(socket).await else {
                    return;
                };
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let reply = "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\n\
                             content-length: 9\r\nconnection: close\r\n\r\nsecure ok";
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    format!("https://127.0.0.1:{}", addr.port())
}

#[tokio::test]
async fn self_signed_upstream_is_rejected_by_default() {
    let base = spawn_self_signed_upstream().await;
    let state = state(RelayConfig::new(Some(&base)));
    assert!(!state.transport.is_insecure());

    let resp = send(
        state,
        Request::builder()
            .uri("/api-proxy/api/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn insecure_transport_accepts_self_signed_upstream() {
    let base = spawn_self_signed_upstream().await;
    let mut config = RelayConfig::new(Some(&base));
    config.upstream.insecure_tls = true;
    let state = state(config);
    assert!(state.transport.is_insecure());

    let resp = send(
        state,
        Request::builder()
            .uri("/api-proxy/api/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "secure ok");
}

// --- rewrite rule ---

fn hosted(base: &str) -> RelayConfig {
    let mut config = RelayConfig::new(Some(base));
    config.rewrite = Some(RewriteRule::public_api("/api", "/api-proxy"));
    config
}

#[tokio::test]
async fn hosted_rewrites_public_api_onto_relay() {
    let base = spawn_upstream().await;
    let resp = send(
        state(hosted(&base)),
        Request::builder()
            .uri("/api/wallet/balance")
            .header(header::AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(json["balance"], 500);
}

#[tokio::test]
async fn without_hosting_public_api_is_not_routed() {
    let base = spawn_upstream().await;
    let resp = send(
        state(RelayConfig::new(Some(&base))),
        Request::builder()
            .uri("/api/wallet/balance")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn relay_path_still_works_when_hosted() {
    let base = spawn_upstream().await;
    let resp = send(
        state(hosted(&base)),
        Request::builder()
            .uri("/api-proxy/status/418")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
}
