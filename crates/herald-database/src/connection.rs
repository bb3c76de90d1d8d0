//! PostgreSQL pool setup.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use herald_core::config::DatabaseConfig;
use herald_core::error::{AppError, ErrorKind};
use herald_core::result::AppResult;

/// Open the pool described by `config`.
pub async fn connect_pool(config: &DatabaseConfig) -> AppResult<PgPool> {
    debug!(url = %redact_url(&config.url), "Opening PostgreSQL pool");

    let pool = pool_options(config)
        .connect(&config.url)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Could not reach PostgreSQL", e))?;

    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "PostgreSQL pool ready"
    );
    Ok(pool)
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
}

/// `url` with any password replaced by `***`.
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}
