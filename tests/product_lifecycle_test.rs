mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn submitted_product_is_hidden_until_approved() {
    let app = TestApp::new().await;
    let maker = app.seed_user("maker@example.com").await;
    let admin = app.seed_user("admin@example.com").await;
    let maker_token = app.token_for(maker, vec![]);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(&maker_token),
            Some(json!({
                "name": "Rocket Notes",
                "tagline": "Notes that launch",
                "website_url": "https://rocketnotes.example.com",
                "image_urls": ["https://cdn.example.com/shot.png"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING");
    let product_id = body["id"].as_str().expect("id present").to_string();

    // Anonymous listing must not include the pending product.
    let (status, body) = app
        .request(Method::GET, "/api/v1/products", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    // Anonymous detail fetch hides it too.
    let (status, _) = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{product_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Moderation requires the admin role.
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{product_id}/status"),
            Some(&maker_token),
            Some(json!({ "status": "ACTIVE" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = app.admin_token(admin);
    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{product_id}/status"),
            Some(&admin_token),
            Some(json!({ "status": "ACTIVE" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ACTIVE");

    // Approval lands a notification in the maker's feed.
    let unread = app
        .state
        .services
        .notifications
        .unread_count(maker)
        .await
        .expect("count should succeed");
    assert_eq!(unread, 1);

    // Now publicly listed.
    let (status, body) = app
        .request(Method::GET, "/api/v1/products", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn only_owner_or_admin_can_edit() {
    let app = TestApp::new().await;
    let maker = app.seed_user("maker@example.com").await;
    let other = app.seed_user("other@example.com").await;
    let product_id = app.seed_active_product(maker, "Editable").await;

    let other_token = app.token_for(other, vec![]);
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{product_id}"),
            Some(&other_token),
            Some(json!({ "tagline": "hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let maker_token = app.token_for(maker, vec![]);
    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{product_id}"),
            Some(&maker_token),
            Some(json!({ "tagline": "fresh coat" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tagline"], "fresh coat");
}

#[tokio::test]
async fn comment_replies_and_helpful_marks_round_trip() {
    let app = TestApp::new().await;
    let maker = app.seed_user("maker@example.com").await;
    let visitor = app.seed_user("visitor@example.com").await;
    let product_id = app.seed_active_product(maker, "Discussable").await;

    let comment = app
        .state
        .services
        .comments
        .add_comment(product_id, visitor, "Any plans for an API?".to_string())
        .await
        .expect("comment should post");

    let maker_token = app.token_for(maker, vec![]);
    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/comments/{}/replies", comment.id),
            Some(&maker_token),
            Some(json!({ "body": "Yes, next quarter" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/comments/{}/helpful", comment.id),
            Some(&maker_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["marked"], true);
    assert_eq!(body["helpful_count"], 1);

    // Second toggle removes the mark.
    let (_, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/comments/{}/helpful", comment.id),
            Some(&maker_token),
            None,
        )
        .await;
    assert_eq!(body["marked"], false);
    assert_eq!(body["helpful_count"], 0);

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{product_id}/comments"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().expect("comment list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["reply_list"].as_array().map(Vec::len), Some(1));
}
