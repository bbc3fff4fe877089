use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    comment::{self, CommentReply, Entity as Comment},
    comment_helpful::{self, Entity as CommentHelpful},
    notification::NotificationKind,
    product::{self, Entity as Product, ProductStatus},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::notifications::push_notification;

/// A comment with its decoded replies and helpful-mark count.
#[derive(Debug, Clone, Serialize)]
pub struct CommentWithMeta {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub reply_list: Vec<CommentReply>,
    pub helpful_count: u64,
}

/// Outcome of a helpful-mark toggle.
#[derive(Debug, Clone, Serialize)]
pub struct HelpfulToggle {
    pub marked: bool,
    pub helpful_count: u64,
}

/// Service for product comments, their embedded replies and helpful marks.
pub struct CommentService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CommentService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn require_active_product(
        &self,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product with ID {} not found", product_id))
            })?;

        if product.status != ProductStatus::Active {
            return Err(ServiceError::InvalidOperation(
                "Only active products accept comments".to_string(),
            ));
        }
        Ok(product)
    }

    /// Posts a top-level comment on an ACTIVE product and notifies the owner.
    #[instrument(skip(self, body))]
    pub async fn add_comment(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        body: String,
    ) -> Result<comment::Model, ServiceError> {
        let body = body.trim().to_string();
        if body.is_empty() {
            return Err(ServiceError::ValidationError(
                "Comment body must not be empty".to_string(),
            ));
        }

        let product = self.require_active_product(product_id).await?;

        let now = Utc::now();
        let created = comment::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            user_id: Set(user_id),
            body: Set(body),
            replies: Set(serde_json::json!([])),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| {
            error!(product_id = %product_id, error = %e, "Failed to create comment");
            ServiceError::db_error(e)
        })?;

        if product.user_id != user_id {
            push_notification(
                &self.db,
                product.user_id,
                Some(user_id),
                Some(product_id),
                NotificationKind::Comment,
                format!("New comment on your product '{}'", product.name),
            )
            .await?;
        }

        self.event_sender
            .send(Event::CommentPosted {
                product_id,
                comment_id: created.id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(comment_id = %created.id, product_id = %product_id, "Comment posted");
        Ok(created)
    }

    /// Appends a reply to a comment's embedded reply list. The parent
    /// comment's author is notified unless they reply to themselves.
    #[instrument(skip(self, body))]
    pub async fn reply_to_comment(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        body: String,
    ) -> Result<comment::Model, ServiceError> {
        let body = body.trim().to_string();
        if body.is_empty() {
            return Err(ServiceError::ValidationError(
                "Reply body must not be empty".to_string(),
            ));
        }

        let existing = Comment::find_by_id(comment_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Comment with ID {} not found", comment_id))
            })?;

        let parent_author = existing.user_id;
        let product_id = existing.product_id;

        let mut replies = existing.reply_list();
        replies.push(CommentReply {
            id: Uuid::new_v4(),
            user_id,
            body,
            created_at: Utc::now(),
        });
        let encoded = serde_json::to_value(&replies)
            .map_err(|e| ServiceError::InternalError(format!("Failed to encode replies: {}", e)))?;

        let mut active: comment::ActiveModel = existing.into();
        active.replies = Set(encoded);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await.map_err(|e| {
            error!(comment_id = %comment_id, error = %e, "Failed to append reply");
            ServiceError::db_error(e)
        })?;

        if parent_author != user_id {
            push_notification(
                &self.db,
                parent_author,
                Some(user_id),
                Some(product_id),
                NotificationKind::Comment,
                "Someone replied to your comment".to_string(),
            )
            .await?;
        }

        info!(comment_id = %comment_id, "Reply appended");
        Ok(updated)
    }

    /// Toggles the caller's helpful mark on a comment.
    ///
    /// Insert-first, same shape as the upvote toggle: a unique-constraint
    /// violation on (comment_id, user_id) flips the call into a removal.
    #[instrument(skip(self))]
    pub async fn toggle_helpful(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<HelpfulToggle, ServiceError> {
        let db = &*self.db;

        let exists = Comment::find_by_id(comment_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .is_some();
        if !exists {
            return Err(ServiceError::NotFound(format!(
                "Comment with ID {} not found",
                comment_id
            )));
        }

        let attempt = comment_helpful::ActiveModel {
            id: Set(Uuid::new_v4()),
            comment_id: Set(comment_id),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await;

        let marked = match attempt {
            Ok(_) => true,
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                CommentHelpful::delete_many()
                    .filter(comment_helpful::Column::CommentId.eq(comment_id))
                    .filter(comment_helpful::Column::UserId.eq(user_id))
                    .exec(db)
                    .await
                    .map_err(|e| {
                        error!(comment_id = %comment_id, user_id = %user_id, error = %e,
                            "Database error when removing helpful mark");
                        ServiceError::db_error(e)
                    })?;
                false
            }
            Err(err) => {
                error!(comment_id = %comment_id, user_id = %user_id, error = %err,
                    "Database error when inserting helpful mark");
                return Err(ServiceError::db_error(err));
            }
        };

        let helpful_count = CommentHelpful::find()
            .filter(comment_helpful::Column::CommentId.eq(comment_id))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(comment_id = %comment_id, user_id = %user_id, marked, helpful_count,
            "Helpful mark toggled");

        Ok(HelpfulToggle {
            marked,
            helpful_count,
        })
    }

    /// Comments on a product, oldest first, with helpful counts attached.
    #[instrument(skip(self))]
    pub async fn list_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<CommentWithMeta>, ServiceError> {
        let comments = Comment::find()
            .filter(comment::Column::ProductId.eq(product_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut out = Vec::with_capacity(comments.len());
        for comment in comments {
            let helpful_count = comment
                .find_related(CommentHelpful)
                .count(&*self.db)
                .await
                .map_err(ServiceError::DatabaseError)?;
            let reply_list = comment.reply_list();
            out.push(CommentWithMeta {
                comment,
                reply_list,
                helpful_count,
            });
        }
        Ok(out)
    }

    /// Deletes a comment (author or admin).
    #[instrument(skip(self))]
    pub async fn delete_comment(
        &self,
        comment_id: Uuid,
        actor_id: Uuid,
        actor_is_admin: bool,
    ) -> Result<(), ServiceError> {
        let existing = Comment::find_by_id(comment_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Comment with ID {} not found", comment_id))
            })?;

        if existing.user_id != actor_id && !actor_is_admin {
            return Err(ServiceError::Forbidden(
                "Only the author or an admin can delete a comment".to_string(),
            ));
        }

        existing.delete(&*self.db).await.map_err(|e| {
            error!(comment_id = %comment_id, error = %e, "Failed to delete comment");
            ServiceError::db_error(e)
        })?;

        info!(comment_id = %comment_id, "Comment deleted");
        Ok(())
    }
}
