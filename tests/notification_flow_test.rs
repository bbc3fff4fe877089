mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn comment_and_review_notify_product_owner() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@example.com").await;
    let visitor = app.seed_user("visitor@example.com").await;
    let product_id = app.seed_active_product(owner, "Launchpad").await;
    let token = app.token_for(visitor, vec![]);

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{product_id}/comments"),
            Some(&token),
            Some(json!({ "body": "Looks great" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{product_id}/reviews"),
            Some(&token),
            Some(json!({ "rating": 5, "body": "Shipped fast" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let owner_token = app.token_for(owner, vec![]);
    let (status, body) = app
        .request(
            Method::GET,
            "/api/v1/notifications/unread-count",
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread"], 2);
}

#[tokio::test]
async fn second_review_by_same_user_conflicts() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@example.com").await;
    let visitor = app.seed_user("visitor@example.com").await;
    let product_id = app.seed_active_product(owner, "OnceOnly").await;
    let token = app.token_for(visitor, vec![]);

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{product_id}/reviews"),
            Some(&token),
            Some(json!({ "rating": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/products/{product_id}/reviews"),
            Some(&token),
            Some(json!({ "rating": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn mark_all_read_clears_the_feed() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@example.com").await;
    let visitor = app.seed_user("visitor@example.com").await;
    let product_id = app.seed_active_product(owner, "Readable").await;

    for i in 0..3 {
        app.state
            .services
            .comments
            .add_comment(product_id, visitor, format!("comment {i}"))
            .await
            .expect("comment should post");
    }

    let owner_token = app.token_for(owner, vec![]);
    let (status, body) = app
        .request(
            Method::PUT,
            "/api/v1/notifications/read-all",
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["marked"], 3);

    let unread = app
        .state
        .services
        .notifications
        .unread_count(owner)
        .await
        .expect("count should succeed");
    assert_eq!(unread, 0);
}

#[tokio::test]
async fn users_cannot_read_each_others_notifications() {
    let app = TestApp::new().await;
    let owner = app.seed_user("owner@example.com").await;
    let visitor = app.seed_user("visitor@example.com").await;
    let intruder = app.seed_user("intruder@example.com").await;
    let product_id = app.seed_active_product(owner, "Private").await;

    app.state
        .services
        .comments
        .add_comment(product_id, visitor, "hello".to_string())
        .await
        .expect("comment should post");

    let (items, _) = app
        .state
        .services
        .notifications
        .list_for_user(owner, 1, 20)
        .await
        .expect("list should succeed");
    let notification_id = items[0].id;

    let intruder_token = app.token_for(intruder, vec![]);
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/v1/notifications/{notification_id}/read"),
            Some(&intruder_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
