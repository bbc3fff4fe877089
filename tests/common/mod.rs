// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Duration as ChronoDuration;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use launchpad_api::{
    auth::{AuthConfig, AuthService, ADMIN_ROLE},
    config::AppConfig,
    db,
    entities::{product, user},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Harness wrapping an application state backed by an in-memory SQLite
/// database. One connection, so every test sees its own isolated schema.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig::for_tests("sqlite::memory:", TEST_JWT_SECRET);

        let db_config = db::DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(5),
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("test database should connect");
        db::run_migrations(&pool)
            .await
            .expect("migrations should apply");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            ChronoDuration::hours(1),
        )));

        let services = AppServices::new(db_arc.clone(), event_sender.clone());

        let state = AppState {
            db: db_arc,
            config: Arc::new(cfg),
            event_sender,
            auth: auth_service.clone(),
            services,
        };

        let router = Router::new()
            .nest("/api/v1", launchpad_api::api_v1_routes())
            .layer(axum::middleware::from_fn(
                launchpad_api::request_id::propagate_request_id,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            auth_service,
            _event_task: event_task,
        }
    }

    /// Issues a bearer token for the given user.
    pub fn token_for(&self, user_id: Uuid, roles: Vec<String>) -> String {
        self.auth_service
            .issue_token(user_id, Some("Test User".to_string()), None, roles)
            .expect("token should be issued")
    }

    pub fn admin_token(&self, user_id: Uuid) -> String {
        self.token_for(user_id, vec![ADMIN_ROLE.to_string()])
    }

    /// Inserts a user row and returns its id.
    pub async fn seed_user(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        user::ActiveModel {
            id: Set(id),
            name: Set(email.split('@').next().unwrap_or("user").to_string()),
            email: Set(email.to_string()),
            avatar_url: Set(None),
            is_admin: Set(false),
            created_at: Set(chrono::Utc::now()),
            updated_at: Set(chrono::Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("user should insert");
        id
    }

    /// Inserts an ACTIVE product owned by `owner_id` and returns its id.
    pub async fn seed_active_product(&self, owner_id: Uuid, name: &str) -> Uuid {
        self.seed_product(owner_id, name, product::ProductStatus::Active)
            .await
    }

    pub async fn seed_product(
        &self,
        owner_id: Uuid,
        name: &str,
        status: product::ProductStatus,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();
        let slug = name
            .to_ascii_lowercase()
            .replace(|c: char| !c.is_ascii_alphanumeric(), "-");
        product::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            slug: Set(format!("{slug}-{id}")),
            tagline: Set(None),
            description: Set(None),
            website_url: Set(None),
            logo_url: Set(None),
            status: Set(status),
            category_id: Set(None),
            subcategory_id: Set(None),
            user_id: Set(owner_id),
            release_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("product should insert");
        id
    }

    /// Sends a request through the router and returns (status, parsed body).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}
