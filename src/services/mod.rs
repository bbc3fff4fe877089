//! Business logic, one service per concern. Services own the database access
//! and event emission; handlers stay thin translation layers over them.

pub mod catalog;
pub mod comments;
pub mod notifications;
pub mod products;
pub mod reviews;
pub mod trending;
pub mod upvotes;

pub use catalog::CatalogService;
pub use comments::CommentService;
pub use notifications::NotificationService;
pub use products::ProductService;
pub use reviews::ReviewService;
pub use trending::TrendingService;
pub use upvotes::UpvoteService;
