use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{Condition, PaginatorTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recipient.
    pub user_id: i64,
    pub message: String,
    pub notification_type: NotificationType,
    pub status: NotificationStatus,
    /// Free-form JSON context, e.g. the device involved in a fraud alert.
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Deserialize,
    Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "notification_type")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum NotificationType {
    #[sea_orm(string_value = "general")]
    General,

    #[sea_orm(string_value = "absence")]
    Absence,

    #[sea_orm(string_value = "alert")]
    Alert,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Deserialize,
    Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "notification_status_type")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum NotificationStatus {
    #[sea_orm(string_value = "sent")]
    Sent,

    #[sea_orm(string_value = "read")]
    Read,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        user_id: i64,
        message: &str,
        notification_type: NotificationType,
        metadata: Option<String>,
    ) -> Result<Model, DbErr> {
        let notification = ActiveModel {
            user_id: Set(user_id),
            message: Set(message.to_owned()),
            notification_type: Set(notification_type),
            status: Set(NotificationStatus::Sent),
            metadata: Set(metadata),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        notification.insert(db).await
    }

    pub async fn for_user(db: &DatabaseConnection, user_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// One page of a user's inbox, newest first, plus the total matching `filter`.
    ///
    /// `page` is 1-based.
    pub async fn page_for_user(
        db: &DatabaseConnection,
        user_id: i64,
        filter: InboxFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Model>, u64), DbErr> {
        let mut condition = Condition::all().add(Column::UserId.eq(user_id));
        if let Some(status) = filter.status {
            condition = condition.add(Column::Status.eq(status));
        }
        if let Some(notification_type) = filter.notification_type {
            condition = condition.add(Column::NotificationType.eq(notification_type));
        }

        let paginator = Entity::find()
            .filter(condition)
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(db, per_page.max(1));

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn unread_count(db: &DatabaseConnection, user_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Status.eq(NotificationStatus::Sent))
            .count(db)
            .await
    }

    /// Marks one of `user_id`'s notifications as read.
    ///
    /// Returns `None` when the notification does not exist or belongs to someone else.
    pub async fn mark_read(
        db: &DatabaseConnection,
        user_id: i64,
        id: i64,
    ) -> Result<Option<Model>, DbErr> {
        let Some(found) = Entity::find_by_id(id)
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        if found.status == NotificationStatus::Read {
            return Ok(Some(found));
        }

        let mut active: ActiveModel = found.into();
        active.status = Set(NotificationStatus::Read);
        active.update(db).await.map(Some)
    }

    /// Marks every unread notification of `user_id` as read. Returns how many changed.
    pub async fn mark_all_read(db: &DatabaseConnection, user_id: i64) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(NotificationStatus::Read))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Status.eq(NotificationStatus::Sent))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }
}

/// Optional narrowing of an inbox listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct InboxFilter {
    pub status: Option<NotificationStatus>,
    pub notification_type: Option<NotificationType>,
}
