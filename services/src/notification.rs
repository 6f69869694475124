//! Side-effect notifications raised by attendance validation.
//!
//! Both operations are best-effort from the caller's point of view: the orchestrator
//! logs a failure here and carries on.

use chrono::{DateTime, Utc};
use db::device_info::DeviceInfo;
use db::models::course::Model as Course;
use db::models::notification::{Model as Notification, NotificationType};
use db::models::parent_child::Model as ParentChild;
use db::models::user::Model as User;
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudReason {
    UnauthorizedDevice,
    SuspiciousDevice,
    LocationMismatch,
}

impl FraudReason {
    fn describe(&self) -> &'static str {
        match self {
            FraudReason::UnauthorizedDevice => "an unrecognised device",
            FraudReason::SuspiciousDevice => "a device shared with other students",
            FraudReason::LocationMismatch => "a location outside the school",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FraudMetadata<'a> {
    student_id: i64,
    course_id: i64,
    device_info: &'a DeviceInfo,
    reason: FraudReason,
    timestamp: DateTime<Utc>,
}

pub struct NotificationService;

impl NotificationService {
    /// One `ABSENCE` notification per parent linked to the student.
    pub async fn notify_parents_of_absence(
        db: &DatabaseConnection,
        student: &User,
        course: &Course,
    ) -> Result<Vec<Notification>, DbErr> {
        let parents = ParentChild::parents_of(db, student.id).await?;
        let message = format!("{} was marked absent in {}.", student.name, course.name);

        let mut sent = Vec::with_capacity(parents.len());
        for parent in parents {
            let notice =
                Notification::create(db, parent.id, &message, NotificationType::Absence, None)
                    .await?;
            sent.push(notice);
        }

        tracing::info!(
            student_id = student.id,
            course_id = course.id,
            parents = sent.len(),
            "absence notifications sent"
        );
        Ok(sent)
    }

    /// An `ALERT` to the course's teacher describing a rejected attempt.
    ///
    /// Returns `None` when the course has no teacher to tell.
    pub async fn raise_fraud_alert(
        db: &DatabaseConnection,
        course: &Course,
        student_id: i64,
        device: &DeviceInfo,
        reason: FraudReason,
        now: DateTime<Utc>,
    ) -> Result<Option<Notification>, DbErr> {
        let Some(teacher_id) = course.teacher_id else {
            tracing::warn!(
                course_id = course.id,
                ?reason,
                "no teacher to alert about suspected fraud"
            );
            return Ok(None);
        };

        let metadata = serde_json::to_string(&FraudMetadata {
            student_id,
            course_id: course.id,
            device_info: device,
            reason,
            timestamp: now,
        })
        .map_err(|e| DbErr::Custom(format!("Failed to encode alert metadata: {e}")))?;

        let message = format!(
            "Attendance attempt by student {student_id} in {} was rejected: {}.",
            course.name,
            reason.describe()
        );

        let alert = Notification::create(
            db,
            teacher_id,
            &message,
            NotificationType::Alert,
            Some(metadata),
        )
        .await?;
        tracing::info!(course_id = course.id, student_id, ?reason, "fraud alert raised");
        Ok(Some(alert))
    }
}
