use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::device_info::GeoPoint;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schools")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Radius around the school, in metres, inside which location check-ins are accepted.
    pub attendance_radius_m: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::class::Entity")]
    Classes,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        name: &str,
        location: Option<GeoPoint>,
        attendance_radius_m: Option<f64>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let school = ActiveModel {
            name: Set(name.to_owned()),
            latitude: Set(location.map(|p| p.latitude)),
            longitude: Set(location.map(|p| p.longitude)),
            attendance_radius_m: Set(attendance_radius_m),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        school.insert(db).await
    }

    /// The school's position, if both coordinates are known.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        }
    }
}
