//! REST fallback for clients without a live connection.
//!
//! Every handler runs the same inbox and preference operations as the live
//! commands, scoped to the authenticated caller.

use axum::Json;
use axum::extract::{Path, Query, State};

use herald_core::error::AppError;
use herald_core::types::id::NotificationId;
use herald_core::types::pagination::PageResponse;
use herald_entity::notification::NotificationPayload;
use herald_entity::preference::PreferenceSummary;

use crate::dto::{ApiResponse, CountResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<NotificationPayload>>>, ApiError> {
    let page = state
        .realtime
        .inbox()
        .page(auth.user_id, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.realtime.inbox().unread_count(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// POST /api/notifications/viewed
pub async fn mark_all_viewed(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.realtime.inbox().mark_all_viewed(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// POST /api/notifications/{id}/opened
pub async fn mark_opened(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !state.realtime.inbox().mark_opened(auth.user_id, id).await? {
        return Err(AppError::not_found(format!("Notification {id} not found")).into());
    }
    Ok(Json(ApiResponse::ok(serde_json::json!({ "opened": true }))))
}

/// GET /api/notifications/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<PreferenceSummary>>, ApiError> {
    let preferences = state.realtime.preferences().get(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(preferences)))
}

/// PUT /api/notifications/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<PreferenceSummary>,
) -> Result<Json<ApiResponse<PreferenceSummary>>, ApiError> {
    let preferences = state
        .realtime
        .preferences()
        .replace(auth.user_id, body)
        .await?;
    Ok(Json(ApiResponse::ok(preferences)))
}
