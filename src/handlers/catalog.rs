use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::handlers::common::success_response;
use crate::AppState;

/// Creates the router for the category directory
pub fn categories_routes() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

/// Creates the router for the alternatives directory
pub fn alternatives_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_alternatives))
        .route("/:id", get(get_alternative))
}

/// All categories with their subcategories
async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(success_response(categories))
}

/// All alternatives
async fn list_alternatives(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let alternatives = state.services.catalog.list_alternatives().await?;
    Ok(success_response(alternatives))
}

/// An alternative and the ACTIVE products positioned against it
async fn get_alternative(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let alternative = state.services.catalog.get_alternative(id).await?;
    Ok(success_response(alternative))
}
