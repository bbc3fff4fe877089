use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::handlers::common::success_response;
use crate::services::trending::{RankedProduct, TrendingProduct, TrendingWindow};
use crate::AppState;

/// Creates the router for the trending and ranking endpoints
pub fn trending_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(trending))
        .route("/top", get(top_upvoted))
        .route("/rankings", get(rankings))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrendingParams {
    /// One of "day", "week" or "month" (case-sensitive)
    pub window: String,
}

#[derive(Debug, Serialize)]
pub struct TrendingEntry {
    #[serde(flatten)]
    pub product: crate::entities::product::Model,
    pub upvote_count: usize,
}

impl From<TrendingProduct> for TrendingEntry {
    fn from(item: TrendingProduct) -> Self {
        let upvote_count = item.upvote_count();
        Self {
            product: item.product,
            upvote_count,
        }
    }
}

fn parse_window(raw: &str) -> Result<TrendingWindow, ApiError> {
    raw.parse::<TrendingWindow>().map_err(ApiError::ServiceError)
}

/// Trending products for the requested window
#[utoipa::path(
    get,
    path = "/api/v1/trending",
    params(TrendingParams),
    responses(
        (status = 200, description = "Trending products, most upvoted first"),
        (status = 400, description = "Unrecognized window")
    ),
    tag = "Trending"
)]
async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let window = parse_window(&params.window)?;
    let items = state.services.trending.trending_products(window).await?;
    let entries: Vec<TrendingEntry> = items.into_iter().map(TrendingEntry::from).collect();
    Ok(success_response(entries))
}

/// The products tied for the highest upvote count in the window
async fn top_upvoted(
    State(state): State<AppState>,
    Query(params): Query<TrendingParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let window = parse_window(&params.window)?;
    let items = state.services.trending.top_upvoted_products(window).await?;
    let entries: Vec<TrendingEntry> = items.into_iter().map(TrendingEntry::from).collect();
    Ok(success_response(entries))
}

/// Dense tie ranks across all ACTIVE products (admin only)
async fn rankings(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    user.require_admin()?;
    let items: Vec<RankedProduct> = state.services.trending.active_product_rankings().await?;
    Ok(success_response(items))
}
