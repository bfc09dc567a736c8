//! Keyhole - credential-hiding proxy for chat-completion APIs
//!
//! This is the main entry point for the Keyhole proxy server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use keyhole::{cli::Args, routes, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_tracing();

    info!("Starting Keyhole proxy");

    // Missing secrets abort startup here
    let mut config = Config::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    args.apply(&mut config);
    info!("Configuration loaded successfully");

    routes::metrics::init_metrics();

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    info!("CORS configured with allow_origin: {}", config.cors_allow_origin);
    info!(
        "Rate limit configured: {} requests per minute",
        config.rate_limit_per_minute
    );
    info!(
        "Upstream timeout configured: {}s",
        config.upstream_timeout.as_secs()
    );

    let state = Arc::new(AppState::new(config)?);
    let app = routes::create_router(state.clone());

    info!("Listening on {}", addr);
    info!("Proxy endpoint: http://{}/api/openai", addr);
    info!("Ping endpoint: http://{}/ping", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Connect info gives the relay handler the caller's address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!(
        uptime_seconds = state.start_time.elapsed().as_secs(),
        "Keyhole shutdown complete"
    );
    Ok(())
}

/// Install the tracing subscriber; `LOG_FORMAT=json` switches to JSON lines
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "keyhole=info,tower_http=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    }
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating shutdown");
        }
    }
}
