//! Route definitions.
//!
//! REST routes live under `/api`; the live connection upgrade is `/ws`.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new()
        .merge(notification_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Notification list, counts, state changes, and preferences
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/viewed",
            post(handlers::notification::mark_all_viewed),
        )
        .route(
            "/notifications/{id}/opened",
            post(handlers::notification::mark_opened),
        )
        .route(
            "/notifications/preferences",
            get(handlers::notification::get_preferences)
                .put(handlers::notification::update_preferences),
        )
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
