mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use common::TestApp;
use launchpad_api::entities::{product, upvote};
use launchpad_api::services::trending::TrendingWindow;

async fn seed_product_at(
    app: &TestApp,
    owner: Uuid,
    name: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        slug: Set(format!("{}-{}", name.to_ascii_lowercase(), id)),
        tagline: Set(None),
        description: Set(None),
        website_url: Set(None),
        logo_url: Set(None),
        status: Set(product::ProductStatus::Active),
        category_id: Set(None),
        subcategory_id: Set(None),
        user_id: Set(owner),
        release_date: Set(None),
        created_at: Set(created_at),
        updated_at: Set(updated_at),
    }
    .insert(&*app.state.db)
    .await
    .expect("product should insert");
    id
}

async fn add_upvotes(app: &TestApp, product_id: Uuid, count: usize) {
    for i in 0..count {
        let voter = app
            .seed_user(&format!("voter-{product_id}-{i}@example.com"))
            .await;
        upvote::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            user_id: Set(voter),
            created_at: Set(Utc::now()),
        }
        .insert(&*app.state.db)
        .await
        .expect("upvote should insert");
    }
}

#[tokio::test]
async fn trending_orders_by_upvotes_within_window() {
    let app = TestApp::new().await;
    let owner = app.seed_user("maker@example.com").await;

    let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
    let quiet = seed_product_at(&app, owner, "Quiet", now, now).await;
    let loud = seed_product_at(&app, owner, "Loud", now, now).await;
    add_upvotes(&app, quiet, 1).await;
    add_upvotes(&app, loud, 3).await;

    let items = app
        .state
        .services
        .trending
        .trending_products_at(TrendingWindow::Day, now)
        .await
        .expect("trending should succeed");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].product.id, loud);
    assert_eq!(items[0].upvote_count(), 3);
    assert_eq!(items[1].product.id, quiet);
}

#[tokio::test]
async fn edited_old_product_resurfaces_in_window() {
    let app = TestApp::new().await;
    let owner = app.seed_user("maker@example.com").await;

    let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
    let long_ago = now - Duration::days(90);

    // Created long ago but updated today; the OR over both timestamps
    // must pull it back into the day window.
    let edited = seed_product_at(&app, owner, "Edited", long_ago, now).await;
    let stale = seed_product_at(&app, owner, "Stale", long_ago, long_ago).await;

    let items = app
        .state
        .services
        .trending
        .trending_products_at(TrendingWindow::Day, now)
        .await
        .expect("trending should succeed");

    let ids: Vec<Uuid> = items.iter().map(|i| i.product.id).collect();
    assert!(ids.contains(&edited));
    assert!(!ids.contains(&stale));
}

#[tokio::test]
async fn pending_products_never_trend() {
    let app = TestApp::new().await;
    let owner = app.seed_user("maker@example.com").await;
    let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();

    let pending = app
        .seed_product(owner, "Hidden", product::ProductStatus::Pending)
        .await;

    let items = app
        .state
        .services
        .trending
        .trending_products_at(TrendingWindow::Day, now)
        .await
        .expect("trending should succeed");

    assert!(items.iter().all(|i| i.product.id != pending));
}

#[tokio::test]
async fn top_upvoted_returns_only_tied_leaders() {
    let app = TestApp::new().await;
    let owner = app.seed_user("maker@example.com").await;
    let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();

    let first = seed_product_at(&app, owner, "First", now, now).await;
    let second = seed_product_at(&app, owner, "Second", now, now).await;
    let third = seed_product_at(&app, owner, "Third", now, now).await;
    add_upvotes(&app, first, 4).await;
    add_upvotes(&app, second, 4).await;
    add_upvotes(&app, third, 1).await;

    let (start, end) = launchpad_api::services::trending::resolve_window(TrendingWindow::Day, now);
    assert!(start < end);

    let top = launchpad_api::services::trending::top_upvoted(
        app.state
            .services
            .trending
            .trending_products_at(TrendingWindow::Day, now)
            .await
            .expect("trending should succeed"),
    );

    let ids: Vec<Uuid> = top.iter().map(|i| i.product.id).collect();
    assert_eq!(top.len(), 2);
    assert!(ids.contains(&first));
    assert!(ids.contains(&second));
}

#[tokio::test]
async fn rankings_assign_dense_first_place() {
    let app = TestApp::new().await;
    let owner = app.seed_user("maker@example.com").await;
    let now = Utc::now();

    let a = seed_product_at(&app, owner, "Alpha", now, now).await;
    let b = seed_product_at(&app, owner, "Beta", now, now).await;
    let c = seed_product_at(&app, owner, "Gamma", now, now).await;
    add_upvotes(&app, a, 5).await;
    add_upvotes(&app, b, 5).await;
    add_upvotes(&app, c, 2).await;

    let ranked = app
        .state
        .services
        .trending
        .active_product_rankings()
        .await
        .expect("rankings should succeed");

    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[1].rank, 1);
    assert_eq!(ranked[2].rank, 2);
    assert_eq!(ranked[2].product.id, c);
}
