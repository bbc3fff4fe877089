use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::entities::product::{self, ProductStatus};
use crate::entities::product_image;
use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input, PaginatedResponse,
};
use crate::services::products::{ProductListQuery, SubmitProductInput, UpdateProductInput};
use crate::AppState;

const MAX_PAGE_SIZE: u64 = 100;

fn parse_status(value: &str) -> Result<ProductStatus, ApiError> {
    match value {
        "PENDING" => Ok(ProductStatus::Pending),
        "ACTIVE" => Ok(ProductStatus::Active),
        "REJECTED" => Ok(ProductStatus::Rejected),
        other => Err(ApiError::ValidationError(format!(
            "Unknown product status: {other}"
        ))),
    }
}

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(submit_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/status", put(set_product_status))
        .route("/:id/upvote", post(toggle_upvote))
        .route("/:id/comments", get(list_comments).post(add_comment))
        .route("/:id/reviews", get(list_reviews).post(add_review))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitProductRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 200))]
    pub tagline: Option<String>,
    pub description: Option<String>,
    #[validate(url)]
    pub website_url: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    pub tagline: Option<String>,
    pub description: Option<String>,
    #[validate(url)]
    pub website_url: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub release_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListParams {
    /// PENDING, ACTIVE or REJECTED; non-admins always see ACTIVE
    pub status: Option<String>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: product::Model,
    pub images: Vec<product_image::Model>,
    pub upvote_count: u64,
    pub upvoted_by_me: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetStatusRequest {
    /// ACTIVE or REJECTED
    pub status: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 4000))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 8000))]
    pub body: Option<String>,
}

/// Submit a new product for moderation
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = SubmitProductRequest,
    responses(
        (status = 201, description = "Product submitted"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Slug already taken")
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
async fn submit_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .products
        .submit_product(
            user.user_id,
            SubmitProductInput {
                name: payload.name,
                tagline: payload.tagline,
                description: payload.description,
                website_url: payload.website_url,
                logo_url: payload.logo_url,
                category_id: payload.category_id,
                subcategory_id: payload.subcategory_id,
                release_date: payload.release_date,
                image_urls: payload.image_urls,
            },
        )
        .await?;

    Ok(created_response(created))
}

/// List products; non-admin callers only ever see ACTIVE entries
async fn list_products(
    user: Option<AuthenticatedUser>,
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let is_admin = user.as_ref().is_some_and(|u| u.is_admin());

    let status = match (&params.status, is_admin) {
        (Some(raw), true) => Some(parse_status(raw)?),
        _ => Some(ProductStatus::Active),
    };

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, MAX_PAGE_SIZE);

    let (items, total) = state
        .services
        .products
        .list_products(ProductListQuery {
            status,
            category_id: params.category_id,
            search: params.search,
            page,
            per_page,
        })
        .await?;

    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

/// Fetch a product with images, upvote count and the caller's upvote state
async fn get_product(
    user: Option<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (product, images) = state.services.products.get_product(id).await?;

    let is_admin = user.as_ref().is_some_and(|u| u.is_admin());
    let is_owner = user.as_ref().is_some_and(|u| u.user_id == product.user_id);
    if product.status != ProductStatus::Active && !is_admin && !is_owner {
        return Err(ApiError::NotFound(format!(
            "Product with ID {} not found",
            id
        )));
    }

    let upvote_count = state.services.upvotes.count_for_product(id).await?;
    let upvoted_by_me = match &user {
        Some(u) => Some(state.services.upvotes.has_upvoted(id, u.user_id).await?),
        None => None,
    };

    Ok(success_response(ProductDetailResponse {
        product,
        images,
        upvote_count,
        upvoted_by_me,
    }))
}

/// Update a product (owner or admin)
async fn update_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let updated = state
        .services
        .products
        .update_product(
            id,
            user.user_id,
            user.is_admin(),
            UpdateProductInput {
                name: payload.name,
                tagline: payload.tagline,
                description: payload.description,
                website_url: payload.website_url,
                logo_url: payload.logo_url,
                category_id: payload.category_id,
                subcategory_id: payload.subcategory_id,
                release_date: payload.release_date,
            },
        )
        .await?;

    Ok(success_response(updated))
}

/// Delete a product (owner or admin)
async fn delete_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .products
        .delete_product(id, user.user_id, user.is_admin())
        .await?;
    Ok(no_content_response())
}

/// Moderate a product (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}/status",
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Product not found")
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
async fn set_product_status(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    user.require_admin()?;

    let status = parse_status(&payload.status)?;
    if status == ProductStatus::Pending {
        return Err(ApiError::ValidationError(
            "A product cannot be moved back to PENDING".to_string(),
        ));
    }

    let updated = state.services.products.set_status(id, status).await?;
    Ok(success_response(updated))
}

/// Toggle the caller's upvote on a product
async fn toggle_upvote(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let result = state.services.upvotes.toggle(id, user.user_id).await?;
    Ok(success_response(result))
}

/// Comments on a product with replies and helpful counts
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let comments = state.services.comments.list_for_product(id).await?;
    Ok(success_response(comments))
}

/// Post a top-level comment
async fn add_comment(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .comments
        .add_comment(id, user.user_id, payload.body)
        .await?;
    Ok(created_response(created))
}

/// Reviews on a product, with the aggregate rating
async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let reviews = state.services.reviews.list_for_product(id).await?;
    let summary = state.services.reviews.rating_summary(id).await?;
    Ok(success_response(serde_json::json!({
        "summary": summary,
        "reviews": reviews,
    })))
}

/// Post a review; one per user per product
async fn add_review(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddReviewRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .reviews
        .add_review(id, user.user_id, payload.rating, payload.body)
        .await?;
    Ok(created_response(created))
}
