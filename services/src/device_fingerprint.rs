//! Last-seen device lookup and comparison for a student.
//!
//! There is no fingerprint table: a student's device is whatever their most recent
//! device-bearing attendance record says it was.

use db::device_info::DeviceInfo;
use db::models::attendance_record::Model as AttendanceRecord;
use sea_orm::{DatabaseConnection, DbErr};

pub struct DeviceFingerprintService;

impl DeviceFingerprintService {
    /// The fingerprint stored on the student's latest device-bearing record.
    ///
    /// `Ok(Some(Err(_)))` means a record exists but its device info no longer decodes.
    pub async fn latest(
        db: &DatabaseConnection,
        student_id: i64,
    ) -> Result<Option<Result<DeviceInfo, serde_json::Error>>, DbErr> {
        Ok(AttendanceRecord::latest_with_device(db, student_id)
            .await?
            .and_then(|record| record.device()))
    }

    /// A device is authorized when it matches the student's last known device on
    /// user agent, platform, browser, OS and IP. The first device ever seen is
    /// authorized by default.
    pub async fn is_authorized(
        db: &DatabaseConnection,
        student_id: i64,
        candidate: &DeviceInfo,
    ) -> Result<bool, DbErr> {
        match Self::latest(db, student_id).await? {
            None => Ok(true),
            Some(Ok(known)) => Ok(known.same_device_and_network(candidate)),
            Some(Err(e)) => {
                tracing::warn!(
                    student_id,
                    error = %e,
                    "stored device info is unreadable; treating device as unknown"
                );
                Ok(false)
            }
        }
    }
}
