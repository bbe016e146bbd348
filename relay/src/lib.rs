//! Same-origin relay for the admin dashboard backend.
//!
//! # Overview
//! Any method under `<relay-prefix>/*` is forwarded to the configured
//! upstream. When the hosting condition is set, `/api/*` is rewritten onto
//! the relay before routing.
//!
//! # Design
//! - `RelayConfig` is resolved once from CLI/env and injected as state.
//! - The `Transport` (and with it the optional certificate-validation
//!   bypass) is built once in `AppState::new` and shared by all requests.
//! - No retries, no queuing; every forward is an independent task.

pub mod config;
pub mod error;
pub mod forward;
pub mod rewrite;
pub mod transport;

use std::sync::Arc;

use axum::{extract::Request, routing::any, Router};
use tokio::net::TcpListener;
use tower::util::MapRequest;
use tower::ServiceExt as _;

pub use config::{Args, RelayConfig, UpstreamTarget};
pub use error::RelayError;
pub use rewrite::RewriteRule;
pub use transport::Transport;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub transport: Arc<Transport>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let transport = Transport::new(config.upstream.insecure_tls)?;
        Ok(Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let route = format!("{}/{{*path}}", state.config.relay_prefix);
    Router::new()
        .route(&route, any(forward::forward))
        .with_state(state)
}

/// The router behind the deployment rewrite rule, if one is configured.
pub fn app(state: AppState) -> MapRequest<Router, impl FnMut(Request) -> Request + Clone> {
    let rule = state.config.rewrite.clone();
    router(state).map_request(move |req: Request| match &rule {
        Some(rule) => rule.apply(req),
        None => req,
    })
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    let service = axum::ServiceExt::<Request>::into_make_service(app(state));
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

pub async fn run(listener: TcpListener, config: RelayConfig) -> Result<(), std::io::Error> {
    let state = AppState::new(config).map_err(std::io::Error::other)?;
    serve(listener, state).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
