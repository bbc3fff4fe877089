use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    notification::NotificationKind,
    product::{self, Entity as Product, ProductStatus},
    review::{self, Entity as Review},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::notifications::push_notification;

/// Aggregate rating for a product's review section header.
#[derive(Debug, Clone, Serialize)]
pub struct RatingSummary {
    pub review_count: u64,
    /// None when the product has no reviews
    pub average_rating: Option<f64>,
}

/// Service for product reviews. One review per (product, user).
pub struct ReviewService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ReviewService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Posts a review on an ACTIVE product. A second review by the same user
    /// trips the (product_id, user_id) unique index and surfaces as Conflict.
    #[instrument(skip(self, body))]
    pub async fn add_review(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        rating: i32,
        body: Option<String>,
    ) -> Result<review::Model, ServiceError> {
        if !(1..=5).contains(&rating) {
            return Err(ServiceError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product with ID {} not found", product_id))
            })?;

        if product.status != ProductStatus::Active {
            return Err(ServiceError::InvalidOperation(
                "Only active products accept reviews".to_string(),
            ));
        }

        let now = Utc::now();
        let attempt = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            user_id: Set(user_id),
            rating: Set(rating),
            body: Set(body.map(|b| b.trim().to_string()).filter(|b| !b.is_empty())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await;

        let created = match attempt {
            Ok(model) => model,
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(ServiceError::Conflict(
                    "You have already reviewed this product".to_string(),
                ));
            }
            Err(err) => {
                error!(product_id = %product_id, user_id = %user_id, error = %err,
                    "Database error when inserting review");
                return Err(ServiceError::db_error(err));
            }
        };

        if product.user_id != user_id {
            push_notification(
                &self.db,
                product.user_id,
                Some(user_id),
                Some(product_id),
                NotificationKind::Review,
                format!("New review on your product '{}'", product.name),
            )
            .await?;
        }

        self.event_sender
            .send(Event::ReviewPosted {
                product_id,
                review_id: created.id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(review_id = %created.id, product_id = %product_id, rating, "Review posted");
        Ok(created)
    }

    /// Reviews on a product, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<review::Model>, ServiceError> {
        Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Review count and average rating for a product.
    #[instrument(skip(self))]
    pub async fn rating_summary(&self, product_id: Uuid) -> Result<RatingSummary, ServiceError> {
        let reviews = self.list_for_product(product_id).await?;

        let review_count = reviews.len() as u64;
        let average_rating = if reviews.is_empty() {
            None
        } else {
            let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
            Some(sum as f64 / reviews.len() as f64)
        };

        Ok(RatingSummary {
            review_count,
            average_rating,
        })
    }

    /// Deletes a review (author or admin).
    #[instrument(skip(self))]
    pub async fn delete_review(
        &self,
        review_id: Uuid,
        actor_id: Uuid,
        actor_is_admin: bool,
    ) -> Result<(), ServiceError> {
        let existing = Review::find_by_id(review_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Review with ID {} not found", review_id))
            })?;

        if existing.user_id != actor_id && !actor_is_admin {
            return Err(ServiceError::Forbidden(
                "Only the author or an admin can delete a review".to_string(),
            ));
        }

        existing.delete(&*self.db).await.map_err(|e| {
            error!(review_id = %review_id, error = %e, "Failed to delete review");
            ServiceError::db_error(e)
        })?;

        info!(review_id = %review_id, "Review deleted");
        Ok(())
    }
}
