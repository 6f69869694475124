use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    /// Teacher of record. Receives fraud alerts and may validate attendance.
    pub teacher_id: Option<i64>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id",
        on_delete = "Cascade"
    )]
    Class,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Teacher,

    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecords,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        class_id: i64,
        teacher_id: Option<i64>,
        name: &str,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let course = ActiveModel {
            class_id: Set(class_id),
            teacher_id: Set(teacher_id),
            name: Set(name.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        course.insert(db).await
    }

    pub fn is_taught_by(&self, user_id: i64) -> bool {
        self.teacher_id == Some(user_id)
    }

    /// Loads the school a course is held at, through its class.
    pub async fn school(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Option<super::school::Model>, DbErr> {
        let Some(class) = super::class::Entity::find_by_id(self.class_id).one(db).await? else {
            return Ok(None);
        };
        super::school::Entity::find_by_id(class.school_id).one(db).await
    }
}
