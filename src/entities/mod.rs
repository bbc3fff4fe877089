pub mod alternative;
pub mod category;
pub mod comment;
pub mod comment_helpful;
pub mod notification;
pub mod product;
pub mod product_alternative;
pub mod product_image;
pub mod review;
pub mod subcategory;
pub mod upvote;
pub mod user;
