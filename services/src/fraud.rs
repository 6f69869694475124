//! Device-sharing detection across students.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use db::device_info::DeviceInfo;
use db::models::attendance_record::Model as AttendanceRecord;
use sea_orm::{DatabaseConnection, DbErr};
use util::config::AppConfig;

#[derive(Debug, Clone, Copy)]
pub struct FraudPolicy {
    /// How far back the scan looks.
    pub window: Duration,
    /// More distinct students than this on one device inside `window` is suspicious.
    pub max_students_per_device: usize,
    /// Upper bound on rows read per scan.
    pub scan_limit: u64,
}

impl Default for FraudPolicy {
    fn default() -> Self {
        Self {
            window: Duration::hours(24),
            max_students_per_device: 2,
            scan_limit: 5000,
        }
    }
}

impl FraudPolicy {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            window: Duration::hours(cfg.fraud_window_hours as i64),
            max_students_per_device: cfg.fraud_max_students_per_device,
            scan_limit: cfg.fraud_scan_limit,
        }
    }
}

pub struct FraudService;

impl FraudService {
    /// Counts the distinct students who used `candidate`'s device inside the policy
    /// window, including `student_id` itself, and flags the device once that count
    /// exceeds the policy maximum.
    ///
    /// Devices match on user agent, platform, browser and OS; the IP is ignored.
    pub async fn is_suspicious(
        db: &DatabaseConnection,
        policy: &FraudPolicy,
        student_id: i64,
        candidate: &DeviceInfo,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let recent = AttendanceRecord::recent_for_device(
            db,
            &candidate.device_key(),
            now,
            policy.window,
            policy.scan_limit,
        )
        .await?;

        if recent.len() as u64 >= policy.scan_limit {
            tracing::warn!(
                limit = policy.scan_limit,
                "fraud scan hit its row limit; older records were not considered"
            );
        }

        let mut students: HashSet<i64> = recent
            .iter()
            .filter(|record| match record.device() {
                Some(Ok(known)) => known.same_device(candidate),
                _ => false,
            })
            .map(|record| record.student_id)
            .collect();
        students.insert(student_id);

        let suspicious = students.len() > policy.max_students_per_device;
        if suspicious {
            tracing::info!(
                student_id,
                distinct_students = students.len(),
                "device shared across too many students"
            );
        }
        Ok(suspicious)
    }
}
