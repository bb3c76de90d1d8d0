//! Herald server: real-time notification delivery.
//!
//! Loads configuration, opens the stores, and serves the live endpoint and
//! REST fallback until SIGINT/SIGTERM.

use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use herald_api::{AppState, build_app, open_stores};
use herald_core::config::AppConfig;
use herald_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `HERALD_ENV` overlay, and `HERALD__*` variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("HERALD_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Herald v{}", env!("CARGO_PKG_VERSION"));

    let stores = open_stores(&config.database).await?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    let state = AppState::new(config, stores);
    let heartbeat = state.realtime.start_heartbeat();
    let app = build_app(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Herald listening on {}", addr);

    let realtime = state.realtime.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, closing live connections...");
            let closed = realtime.shutdown();
            tracing::info!(connections = closed, "Live connections closed");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if tokio::time::timeout(grace, heartbeat).await.is_err() {
        tracing::warn!("Heartbeat task did not stop within the grace period");
    }

    tracing::info!("Herald shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
}
