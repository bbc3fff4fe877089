use axum::{
    extract::{Path, State},
    routing::delete,
    Router,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::handlers::common::no_content_response;
use crate::AppState;

/// Creates the router for review endpoints; creation and listing live under
/// the product routes.
pub fn reviews_routes() -> Router<AppState> {
    Router::new().route("/:id", delete(delete_review))
}

/// Delete a review (author or admin)
async fn delete_review(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .reviews
        .delete_review(id, user.user_id, user.is_admin())
        .await?;
    Ok(no_content_response())
}
