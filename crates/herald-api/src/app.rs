//! Application builder: store selection and router assembly.

use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};

use herald_core::config::DatabaseConfig;
use herald_core::result::AppResult;
use herald_database::migration::run_migrations;
use herald_database::{MemoryStore, Stores, connect_pool};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Opens the configured stores.
///
/// `memory://` selects the in-process store; anything else is treated as a
/// PostgreSQL URL and migrated before use.
pub async fn open_stores(config: &DatabaseConfig) -> AppResult<Stores> {
    if config.is_memory() {
        warn!("Using the in-memory store; notifications are lost on restart");
        return Ok(Stores::memory(Arc::new(MemoryStore::new())));
    }

    let pool = connect_pool(config).await?;
    run_migrations(&pool).await?;
    info!("PostgreSQL stores ready");
    Ok(Stores::postgres(pool))
}
