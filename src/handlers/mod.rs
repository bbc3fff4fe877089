pub mod catalog;
pub mod comments;
pub mod common;
pub mod notifications;
pub mod products;
pub mod reviews;
pub mod trending;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    CatalogService, CommentService, NotificationService, ProductService, ReviewService,
    TrendingService, UpvoteService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub upvotes: Arc<UpvoteService>,
    pub comments: Arc<CommentService>,
    pub reviews: Arc<ReviewService>,
    pub trending: Arc<TrendingService>,
    pub notifications: Arc<NotificationService>,
    pub catalog: Arc<CatalogService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            products: Arc::new(ProductService::new(db_pool.clone(), event_sender.clone())),
            upvotes: Arc::new(UpvoteService::new(db_pool.clone(), event_sender.clone())),
            comments: Arc::new(CommentService::new(db_pool.clone(), event_sender.clone())),
            reviews: Arc::new(ReviewService::new(db_pool.clone(), event_sender)),
            trending: Arc::new(TrendingService::new(db_pool.clone())),
            notifications: Arc::new(NotificationService::new(db_pool.clone())),
            catalog: Arc::new(CatalogService::new(db_pool)),
        }
    }
}
