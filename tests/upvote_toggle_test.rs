mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use common::TestApp;
use launchpad_api::entities::{product::ProductStatus, upvote};

#[tokio::test]
async fn toggle_creates_then_removes_upvote() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@example.com").await;
    let voter = app.seed_user("voter@example.com").await;
    let product_id = app.seed_active_product(owner, "Widget").await;
    let token = app.token_for(voter, vec![]);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{product_id}/upvote"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upvoted"], true);
    assert_eq!(body["upvote_count"], 1);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{product_id}/upvote"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upvoted"], false);
    assert_eq!(body["upvote_count"], 0);
}

#[tokio::test]
async fn duplicate_insert_is_absorbed_as_toggle_off() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@example.com").await;
    let voter = app.seed_user("voter@example.com").await;
    let product_id = app.seed_active_product(owner, "Gadget").await;

    // Pre-existing row, as if a concurrent request won the insert race.
    upvote::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        user_id: Set(voter),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&*app.state.db)
    .await
    .expect("upvote should insert");

    let result = app
        .state
        .services
        .upvotes
        .toggle(product_id, voter)
        .await
        .expect("toggle should succeed");

    assert!(!result.upvoted);
    assert_eq!(result.upvote_count, 0);
}

#[tokio::test]
async fn pending_product_cannot_be_upvoted() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@example.com").await;
    let voter = app.seed_user("voter@example.com").await;
    let product_id = app
        .seed_product(owner, "Unreviewed", ProductStatus::Pending)
        .await;
    let token = app.token_for(voter, vec![]);

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{product_id}/upvote"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upvote_requires_authentication() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@example.com").await;
    let product_id = app.seed_active_product(owner, "NoAuth").await;

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{product_id}/upvote"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upvote_notifies_owner_but_not_self_vote() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@example.com").await;
    let voter = app.seed_user("voter@example.com").await;
    let product_id = app.seed_active_product(owner, "Notifier").await;

    app.state
        .services
        .upvotes
        .toggle(product_id, voter)
        .await
        .expect("toggle should succeed");
    // Owner upvoting their own product must not self-notify.
    app.state
        .services
        .upvotes
        .toggle(product_id, owner)
        .await
        .expect("toggle should succeed");

    let owner_unread = app
        .state
        .services
        .notifications
        .unread_count(owner)
        .await
        .expect("count should succeed");
    assert_eq!(owner_unread, 1);
}
