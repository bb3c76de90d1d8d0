//! Application state shared across all handlers.

use std::sync::Arc;

use herald_core::config::AppConfig;
use herald_database::Stores;
use herald_realtime::RealtimeEngine;

/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Live notification engine
    pub realtime: Arc<RealtimeEngine>,
}

impl AppState {
    /// Builds the engine over `stores` and wraps it for sharing.
    pub fn new(config: AppConfig, stores: Stores) -> Self {
        let realtime = RealtimeEngine::new(&config.realtime, &config.auth, stores);
        Self {
            config: Arc::new(config),
            realtime: Arc::new(realtime),
        }
    }
}
