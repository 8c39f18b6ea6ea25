//! Work Item Service (wis-service) - Main entry point
//!
//! Serves canonical work items, payloads and baselines resolved across the
//! release ticket service and the legacy issue tracker.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wis_common::config::{load_config, ServiceConfig};
use wis_service::clients::{PrimaryClient, SecondaryClient};
use wis_service::payload::PayloadExtractor;
use wis_service::{build_router, AppState, SourceResolver};

/// Command-line arguments for wis-service
#[derive(Parser, Debug)]
#[command(name = "wis-service")]
#[command(about = "Work item resolution service")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "WIS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Tracing needs the configured level, so the config is read first and
    // any load failure is reported once the subscriber is up
    let loaded = load_config(args.config.as_deref());
    let level = loaded
        .as_ref()
        .map(|config| config.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=debug", level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Work Item Service (wis-service) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config: ServiceConfig = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e).context("Failed to load configuration");
        }
    };
    config.validate().context("Invalid configuration")?;

    info!("Release ticket service: {}", config.primary.base_url);
    info!(
        "Legacy tracker: {} (project {})",
        config.secondary.base_url, config.secondary.project
    );

    let primary = PrimaryClient::new(&config.primary)
        .context("Failed to create release ticket service client")?;
    let secondary =
        SecondaryClient::new(&config.secondary).context("Failed to create legacy tracker client")?;

    let resolver = SourceResolver::new(
        Arc::new(primary),
        Arc::new(secondary),
        PayloadExtractor::new(config.extraction.max_concurrency),
        config.products.clone(),
    );

    let app = build_router(AppState::new(resolver));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("wis-service listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
