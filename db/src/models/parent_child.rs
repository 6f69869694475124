use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user::{self, Role};

/// Links a parent account to a student account.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parent_children")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub parent_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub child_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ParentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Parent,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ChildId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Child,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn link(
        db: &DatabaseConnection,
        parent_id: i64,
        child_id: i64,
    ) -> Result<Model, DbErr> {
        let link = ActiveModel {
            parent_id: Set(parent_id),
            child_id: Set(child_id),
            created_at: Set(Utc::now()),
        };

        link.insert(db).await
    }

    /// All users with the parent role linked to `child_id`.
    pub async fn parents_of(
        db: &DatabaseConnection,
        child_id: i64,
    ) -> Result<Vec<user::Model>, DbErr> {
        let parent_ids: Vec<i64> = Entity::find()
            .filter(Column::ChildId.eq(child_id))
            .all(db)
            .await?
            .into_iter()
            .map(|link| link.parent_id)
            .collect();

        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        user::Entity::find()
            .filter(user::Column::Id.is_in(parent_ids))
            .filter(user::Column::Role.eq(Role::Parent))
            .all(db)
            .await
    }
}
