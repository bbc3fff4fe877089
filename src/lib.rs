/*!
Launchpad API

Backend for a product launch platform: makers submit products, the community
upvotes, comments and reviews them, and trending feeds surface what is hot in
the current day, week or month window.
*/

use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod request_id;
pub mod services;

pub use handlers::AppServices;

/// Shared application state available to all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: Arc<events::EventSender>,
    pub auth: Arc<auth::AuthService>,
    pub services: AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: request_id::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Builds the versioned API router. Mounted under `/api/v1` by `main`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Products, with nested upvote/comment/review creation
        .nest("/products", handlers::products::products_routes())
        // Comment replies, helpful marks, deletion
        .nest("/comments", handlers::comments::comments_routes())
        // Review deletion
        .nest("/reviews", handlers::reviews::reviews_routes())
        // Trending feeds and admin rankings
        .nest("/trending", handlers::trending::trending_routes())
        // Notification feed
        .nest("/notifications", handlers::notifications::notifications_routes())
        // Directory lookups
        .nest("/categories", handlers::catalog::categories_routes())
        .nest("/alternatives", handlers::catalog::alternatives_routes())
}

async fn api_status() -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "launchpad-api",
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> ApiResult<Value> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "database": db_status,
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[tokio::test]
    async fn success_response_carries_request_id() {
        let response = request_id::scope_request_id(request_id::RequestId::new("req-7"), async {
            ApiResponse::success("ok")
        })
        .await;

        assert!(response.success);
        assert_eq!(response.data, Some("ok"));
        let meta = response.meta.expect("meta should be present");
        assert_eq!(meta.request_id.as_deref(), Some("req-7"));
    }

    #[tokio::test]
    async fn error_response_without_scope_has_no_request_id() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("oops"));
        let meta = response.meta.expect("meta should be present");
        assert!(meta.request_id.is_none());
    }
}
