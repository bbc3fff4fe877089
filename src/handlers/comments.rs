use axum::{
    extract::{Json, Path, State},
    routing::{delete, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::handlers::common::{created_response, no_content_response, success_response, validate_input};
use crate::AppState;

/// Creates the router for comment endpoints
pub fn comments_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/replies", post(reply_to_comment))
        .route("/:id/helpful", post(toggle_helpful))
        .route("/:id", delete(delete_comment))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplyRequest {
    #[validate(length(min = 1, max = 4000))]
    pub body: String,
}

/// Append a reply to a comment's embedded reply list
async fn reply_to_comment(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplyRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let updated = state
        .services
        .comments
        .reply_to_comment(id, user.user_id, payload.body)
        .await?;
    Ok(created_response(updated))
}

/// Toggle the caller's helpful mark on a comment
async fn toggle_helpful(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let result = state
        .services
        .comments
        .toggle_helpful(id, user.user_id)
        .await?;
    Ok(success_response(result))
}

/// Delete a comment (author or admin)
async fn delete_comment(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .comments
        .delete_comment(id, user.user_id, user.is_admin())
        .await?;
    Ok(no_content_response())
}
