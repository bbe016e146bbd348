use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use admin_relay::{AppState, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("admin_relay={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let config = args.relay_config();

    info!("======================================");
    info!("  Admin API relay");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Relay prefix: {}", config.relay_prefix);
    match &config.upstream.base_url {
        Some(base) => info!("Upstream: {}", base),
        None => warn!("Upstream: API_BASE not set, every forward will fail with 500"),
    }
    if config.upstream.insecure_tls {
        warn!("Transport: INSECURE (certificate validation off)");
    } else {
        info!("Transport: verified TLS");
    }
    match &config.timeout {
        Some(t) => info!("Upstream timeout: {} ms", t.as_millis()),
        None => info!("Upstream timeout: none"),
    }
    match &config.rewrite {
        Some(rule) => info!("Rewrite: {}/* -> {}/*", rule.source(), rule.destination()),
        None => info!("Rewrite: off"),
    }
    info!("======================================");

    let state = AppState::new(config)?;
    let listener = TcpListener::bind(args.listen).await?;
    info!("listening on {}", listener.local_addr()?);

    admin_relay::serve(listener, state).await?;
    Ok(())
}
