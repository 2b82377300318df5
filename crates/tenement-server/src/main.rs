//! Tenement Sync REST API Server
//!
//! This binary starts the HTTP server exposing the sync and progress
//! endpoints over a PostgreSQL-backed tenement store.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tenement_core::{HttpConfig, SyncConfig, load_jurisdictions_config};
use tenement_db::TenementRepository;

use tenement_server::{AppState, ServerConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command line arguments
    let config = ServerConfig::parse();

    // Connect to database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connection established");

    // Load jurisdiction configuration
    let jurisdictions = load_jurisdictions_config(config.jurisdictions_config.clone())
        .context("Failed to load jurisdictions config")?;
    info!(
        enabled = ?jurisdictions.enabled_jurisdictions(),
        wa_endpoint = %jurisdictions.wa.endpoint,
        "Loaded jurisdiction configuration"
    );

    // Create shutdown token for graceful shutdown
    let shutdown_token = CancellationToken::new();

    let app_state = AppState::new(
        TenementRepository::new(pool),
        jurisdictions,
        SyncConfig::from_env(),
        HttpConfig::from_env(),
        shutdown_token.clone(),
    );

    let app = create_router(app_state, &config.cors_origins);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid address")?;

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Starting tenement sync server on http://{}", addr);
    info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");

    // Cancel in-flight sync runs
    shutdown_token.cancel();

    // Give runs time to record their cancelled state
    tokio::time::sleep(Duration::from_secs(2)).await;
}
