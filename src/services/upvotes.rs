use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    notification::NotificationKind,
    product::{self, Entity as Product, ProductStatus},
    upvote::{self, Entity as Upvote},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::notifications::push_notification;

/// Outcome of an upvote toggle.
#[derive(Debug, Clone, Serialize)]
pub struct UpvoteToggle {
    /// Whether the caller's upvote exists after the toggle
    pub upvoted: bool,
    /// Total upvotes on the product after the toggle
    pub upvote_count: u64,
}

/// Service for the per-user upvote toggle and counts.
pub struct UpvoteService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl UpvoteService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Toggles the caller's upvote on an ACTIVE product.
    ///
    /// The insert is attempted first; a unique-constraint violation on
    /// (product_id, user_id) means the upvote already exists and flips the
    /// call into a removal. The constraint, not a prior existence check, is
    /// what keeps concurrent double submissions from creating duplicates.
    #[instrument(skip(self))]
    pub async fn toggle(&self, product_id: Uuid, user_id: Uuid) -> Result<UpvoteToggle, ServiceError> {
        let db = &*self.db;

        let product = Product::find_by_id(product_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(product_id = %product_id, error = %e, "Database error when fetching product");
                ServiceError::db_error(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product with ID {} not found", product_id))
            })?;

        if product.status != ProductStatus::Active {
            return Err(ServiceError::InvalidOperation(
                "Only active products can be upvoted".to_string(),
            ));
        }

        let attempt = upvote::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await;

        let upvoted = match attempt {
            Ok(_) => {
                if product.user_id != user_id {
                    push_notification(
                        db,
                        product.user_id,
                        Some(user_id),
                        Some(product_id),
                        NotificationKind::Upvote,
                        format!("Your product '{}' received an upvote", product.name),
                    )
                    .await?;
                }
                true
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Upvote::delete_many()
                    .filter(upvote::Column::ProductId.eq(product_id))
                    .filter(upvote::Column::UserId.eq(user_id))
                    .exec(db)
                    .await
                    .map_err(|e| {
                        error!(product_id = %product_id, user_id = %user_id, error = %e,
                            "Database error when removing upvote");
                        ServiceError::db_error(e)
                    })?;
                false
            }
            Err(err) => {
                error!(product_id = %product_id, user_id = %user_id, error = %err,
                    "Database error when inserting upvote");
                return Err(ServiceError::db_error(err));
            }
        };

        self.event_sender
            .send(Event::UpvoteToggled {
                product_id,
                user_id,
                upvoted,
            })
            .await
            .map_err(ServiceError::EventError)?;

        let upvote_count = self.count_for_product(product_id).await?;

        info!(product_id = %product_id, user_id = %user_id, upvoted, upvote_count,
            "Upvote toggled");

        Ok(UpvoteToggle {
            upvoted,
            upvote_count,
        })
    }

    /// Total upvotes on a product.
    #[instrument(skip(self))]
    pub async fn count_for_product(&self, product_id: Uuid) -> Result<u64, ServiceError> {
        Upvote::find()
            .filter(upvote::Column::ProductId.eq(product_id))
            .count(&*self.db)
            .await
            .map_err(|e| {
                error!(product_id = %product_id, error = %e, "Database error when counting upvotes");
                ServiceError::db_error(e)
            })
    }

    /// Whether the given user currently upvotes the product.
    #[instrument(skip(self))]
    pub async fn has_upvoted(&self, product_id: Uuid, user_id: Uuid) -> Result<bool, ServiceError> {
        let existing = Upvote::find()
            .filter(upvote::Column::ProductId.eq(product_id))
            .filter(upvote::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(existing.is_some())
    }
}
