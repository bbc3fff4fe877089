use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::notification::{self, Entity as Notification, NotificationKind};
use crate::errors::ServiceError;

/// Inserts a notification row. Shared by the product/upvote/comment/review
/// services so fan-out stays a one-liner at each call site.
pub(crate) async fn push_notification(
    db: &DbPool,
    user_id: Uuid,
    actor_id: Option<Uuid>,
    product_id: Option<Uuid>,
    kind: NotificationKind,
    body: String,
) -> Result<(), ServiceError> {
    notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        actor_id: Set(actor_id),
        product_id: Set(product_id),
        kind: Set(kind),
        body: Set(body),
        is_read: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .map_err(|e| {
        error!(user_id = %user_id, error = %e, "Database error when creating notification");
        ServiceError::db_error(e)
    })?;
    Ok(())
}

/// Service for the recipient-facing notification feed.
pub struct NotificationService {
    db: Arc<DbPool>,
}

impl NotificationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// The user's notifications, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<notification::Model>, u64), ServiceError> {
        let paginator = Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((items, total))
    }

    /// Count of unread notifications for badge display.
    #[instrument(skip(self))]
    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Marks one of the user's notifications read.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), ServiceError> {
        let item = Notification::find_by_id(notification_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Notification with ID {} not found",
                    notification_id
                ))
            })?;

        if item.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "Notification belongs to another user".to_string(),
            ));
        }

        let mut active: notification::ActiveModel = item.into();
        active.is_read = Set(true);
        active.update(&*self.db).await.map_err(|e| {
            error!(notification_id = %notification_id, error = %e,
                "Database error when marking notification read");
            ServiceError::db_error(e)
        })?;
        Ok(())
    }

    /// Marks every unread notification for the user read in one statement.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, sea_orm::sea_query::Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&*self.db)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e,
                    "Database error when marking notifications read");
                ServiceError::db_error(e)
            })?;

        info!(user_id = %user_id, marked = result.rows_affected, "Notifications marked read");
        Ok(result.rows_affected)
    }
}
