//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let registry = state.realtime.registry();
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        connections: registry.connection_count(),
        online_users: registry.user_count(),
    }))
}
