use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification entity, produced as a side effect of upvote/comment/review
/// and moderation actions and consumed by the recipient's feed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Recipient
    pub user_id: Uuid,
    /// User whose action produced the notification, if any
    pub actor_id: Option<Uuid>,
    /// Product the notification is about, if any
    pub product_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Recipient,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum NotificationKind {
    #[sea_orm(string_value = "UPVOTE")]
    Upvote,
    #[sea_orm(string_value = "COMMENT")]
    Comment,
    #[sea_orm(string_value = "REVIEW")]
    Review,
    #[sea_orm(string_value = "STATUS_CHANGE")]
    StatusChange,
}
