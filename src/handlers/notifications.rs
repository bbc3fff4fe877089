use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::handlers::common::{
    no_content_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::AppState;

/// Creates the router for the caller's notification feed
pub fn notifications_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/:id/read", put(mark_read))
        .route("/read-all", put(mark_all_read))
}

/// The caller's notifications, newest first
async fn list_notifications(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = pagination.page.max(1);
    let per_page = pagination.per_page.clamp(1, 100);

    let (items, total) = state
        .services
        .notifications
        .list_for_user(user.user_id, page, per_page)
        .await?;

    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

/// Unread count for badge display
async fn unread_count(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let count = state
        .services
        .notifications
        .unread_count(user.user_id)
        .await?;
    Ok(success_response(json!({ "unread": count })))
}

/// Mark one notification read
async fn mark_read(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .notifications
        .mark_read(user.user_id, id)
        .await?;
    Ok(no_content_response())
}

/// Mark all of the caller's notifications read
async fn mark_all_read(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let marked = state
        .services
        .notifications
        .mark_all_read(user.user_id)
        .await?;
    Ok(success_response(json!({ "marked": marked })))
}
