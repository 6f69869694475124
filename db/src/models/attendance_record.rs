use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::device_info::DeviceInfo;

/// One presence mark for a student in a course.
///
/// At most one row exists per `(student_id, course_id, attendance_day)`; the store
/// enforces this with a unique index, so a racing duplicate insert fails.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub marked_at: DateTime<Utc>,
    /// UTC calendar day of `marked_at`.
    pub attendance_day: NaiveDate,
    pub status: AttendanceStatus,
    pub validation_method: ValidationMethod,
    pub validated_by_id: Option<i64>,
    /// JSON-encoded [`DeviceInfo`].
    pub device_info: Option<String>,
    /// [`DeviceInfo::device_key`] of `device_info`, indexed for the fraud scan.
    #[serde(skip_serializing)]
    pub device_key: Option<String>,
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status_type")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "absent")]
    Absent,

    #[sea_orm(string_value = "excuse")]
    Excuse,
}

/// Channel through which a presence claim was authenticated.
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "validation_method_type")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ValidationMethod {
    #[sea_orm(string_value = "manual")]
    Manual,

    #[sea_orm(string_value = "qr")]
    Qr,

    #[sea_orm(string_value = "location")]
    Location,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,

    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Values needed to insert a new attendance record.
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub student_id: i64,
    pub course_id: i64,
    pub marked_at: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub validation_method: ValidationMethod,
    pub validated_by_id: Option<i64>,
    pub device_info: Option<DeviceInfo>,
}

fn encode_device(device: Option<&DeviceInfo>) -> Result<(Option<String>, Option<String>), DbErr> {
    match device {
        Some(d) => {
            let raw = d
                .encode()
                .map_err(|e| DbErr::Custom(format!("Failed to encode device info: {e}")))?;
            Ok((Some(raw), Some(d.device_key())))
        }
        None => Ok((None, None)),
    }
}

impl Model {
    pub async fn create(db: &DatabaseConnection, new: NewAttendanceRecord) -> Result<Model, DbErr> {
        let (device_info, device_key) = encode_device(new.device_info.as_ref())?;

        let record = ActiveModel {
            student_id: Set(new.student_id),
            course_id: Set(new.course_id),
            marked_at: Set(new.marked_at),
            attendance_day: Set(new.marked_at.date_naive()),
            status: Set(new.status),
            validation_method: Set(new.validation_method),
            validated_by_id: Set(new.validated_by_id),
            device_info: Set(device_info),
            device_key: Set(device_key),
            ..Default::default()
        };

        record.insert(db).await
    }

    /// The record for a student and course on a given UTC day, if any.
    pub async fn find_for_day(
        db: &DatabaseConnection,
        student_id: i64,
        course_id: i64,
        day: NaiveDate,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::AttendanceDay.eq(day))
            .one(db)
            .await
    }

    /// The student's most recent record that carries device info.
    pub async fn latest_with_device(
        db: &DatabaseConnection,
        student_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::DeviceInfo.is_not_null())
            .order_by_desc(Column::MarkedAt)
            .order_by_desc(Column::Id)
            .one(db)
            .await
    }

    /// Records made from the device identified by `device_key` within `lookback` of `now`,
    /// newest first and capped at `limit` rows.
    pub async fn recent_for_device(
        db: &DatabaseConnection,
        device_key: &str,
        now: DateTime<Utc>,
        lookback: Duration,
        limit: u64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::DeviceKey.eq(device_key))
            .filter(Column::MarkedAt.gte(now - lookback))
            .filter(Column::MarkedAt.lte(now))
            .order_by_desc(Column::MarkedAt)
            .limit(limit)
            .all(db)
            .await
    }

    /// Amends how an existing record was validated. Nothing else on a record is mutable.
    ///
    /// Passing no device keeps the stored one.
    pub async fn amend_validation(
        &self,
        db: &DatabaseConnection,
        method: ValidationMethod,
        validated_by_id: i64,
        device: Option<&DeviceInfo>,
    ) -> Result<Model, DbErr> {
        let mut active: ActiveModel = self.clone().into();
        active.validation_method = Set(method);
        active.validated_by_id = Set(Some(validated_by_id));
        if device.is_some() {
            let (device_info, device_key) = encode_device(device)?;
            active.device_info = Set(device_info);
            active.device_key = Set(device_key);
        }

        active.update(db).await
    }

    /// Decodes the stored fingerprint. `None` when the record has no device info.
    pub fn device(&self) -> Option<Result<DeviceInfo, serde_json::Error>> {
        self.device_info.as_deref().map(DeviceInfo::decode)
    }
}
