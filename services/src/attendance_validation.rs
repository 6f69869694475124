//! Composes eligibility, token, device, fraud and proximity checks into the three ways
//! a presence mark can be validated.
//!
//! Every attempt either ends with exactly one new attendance record or is rejected with
//! a single [`ErrorCode`](crate::error::ErrorCode). Notifications triggered along the
//! way never decide the outcome.

use chrono::{DateTime, Utc};
use db::device_info::{DeviceInfo, GeoPoint};
use db::models::attendance_record::{
    self, AttendanceStatus, Model as AttendanceRecord, NewAttendanceRecord, ValidationMethod,
};
use db::models::course::{self, Model as Course};
use sea_orm::{DatabaseConnection, EntityTrait, SqlErr};
use util::config::AppConfig;

use crate::device_fingerprint::DeviceFingerprintService;
use crate::eligibility::{EligibilityService, Eligible};
use crate::error::{AttendanceError, ValidationOutcome};
use crate::fraud::{FraudPolicy, FraudService};
use crate::location::LocationService;
use crate::notification::{FraudReason, NotificationService};
use crate::principal::Principal;
use crate::qr_token::{InvalidSecret, IssuedToken, QrTokenCodec};

/// Method-specific part of a validation request.
#[derive(Debug, Clone)]
pub enum ValidationPayload {
    /// A student scanning the code shown in class.
    Qr { code: String, device_info: DeviceInfo },
    /// A teacher or admin recording attendance on a student's behalf.
    Manual {
        status: AttendanceStatus,
        device_info: Option<DeviceInfo>,
    },
    /// A student checking in from their current position.
    Location {
        device_info: DeviceInfo,
        location: GeoPoint,
    },
}

impl ValidationPayload {
    pub fn method(&self) -> ValidationMethod {
        match self {
            ValidationPayload::Qr { .. } => ValidationMethod::Qr,
            ValidationPayload::Manual { .. } => ValidationMethod::Manual,
            ValidationPayload::Location { .. } => ValidationMethod::Location,
        }
    }
}

/// What gets written once every gate has passed.
struct Mark<'a> {
    status: AttendanceStatus,
    method: ValidationMethod,
    device: Option<&'a DeviceInfo>,
}

#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub student_id: i64,
    pub course_id: i64,
    pub principal: Principal,
    pub payload: ValidationPayload,
}

#[derive(Debug, Clone)]
pub struct AttendanceValidationService {
    codec: QrTokenCodec,
    fraud: FraudPolicy,
    school_radius_m: f64,
}

impl AttendanceValidationService {
    pub fn new(codec: QrTokenCodec, fraud: FraudPolicy, school_radius_m: f64) -> Self {
        Self {
            codec,
            fraud,
            school_radius_m,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, InvalidSecret> {
        Ok(Self::new(
            QrTokenCodec::from_config(cfg)?,
            FraudPolicy::from_config(cfg),
            cfg.school_radius_meters,
        ))
    }

    /// Issues a QR token for a course. Only its teacher or an admin may do so.
    pub async fn generate_qr(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        course_id: i64,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AttendanceError> {
        let course = EligibilityService::can_manage_course(db, principal, course_id).await?;
        let token = self.codec.generate(course.id, now);
        tracing::info!(
            course_id,
            issued_by = principal.id,
            expires_at = %token.expires_at,
            "QR token issued"
        );
        Ok(token)
    }

    /// Runs one validation attempt to completion.
    pub async fn validate(
        &self,
        db: &DatabaseConnection,
        request: ValidationRequest,
        now: DateTime<Utc>,
    ) -> ValidationOutcome {
        let method = request.payload.method();
        let result = self.process(db, &request, now).await;

        match &result {
            Ok(record) => tracing::info!(
                record_id = record.id,
                student_id = request.student_id,
                course_id = request.course_id,
                %method,
                "attendance recorded"
            ),
            Err(AttendanceError::Internal(e)) => tracing::error!(
                student_id = request.student_id,
                course_id = request.course_id,
                %method,
                error = %e,
                "attendance validation failed"
            ),
            Err(e) => tracing::info!(
                student_id = request.student_id,
                course_id = request.course_id,
                %method,
                code = %e.code(),
                "attendance rejected"
            ),
        }

        result.into()
    }

    async fn process(
        &self,
        db: &DatabaseConnection,
        request: &ValidationRequest,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let principal = &request.principal;
        let student_id = request.student_id;

        match &request.payload {
            ValidationPayload::Qr { code, device_info } => {
                self.require_self_service(principal, student_id)?;
                let eligible =
                    EligibilityService::can_mark(db, student_id, request.course_id, now).await?;

                let token = self
                    .codec
                    .verify(code, now)
                    .ok_or(AttendanceError::InvalidToken)?;
                if token.course_id != eligible.course.id {
                    return Err(AttendanceError::InvalidToken);
                }

                self.check_device(db, &eligible.course, student_id, device_info, now)
                    .await?;
                if let Some(point) = device_info.location {
                    self.check_location(db, &eligible.course, student_id, device_info, point, now)
                        .await?;
                }

                let mark = Mark {
                    status: AttendanceStatus::Present,
                    method: ValidationMethod::Qr,
                    device: Some(device_info),
                };
                self.record(db, &eligible, principal, mark, now).await
            }

            ValidationPayload::Manual {
                status,
                device_info,
            } => {
                // Permission first, so callers learn nothing about students they cannot manage.
                let course = course::Entity::find_by_id(request.course_id).one(db).await?;
                if let Some(course) = &course {
                    if !EligibilityService::may_manage(principal, course) {
                        return Err(AttendanceError::NotAuthorizedToValidate(
                            "only an admin or the course's teacher may validate attendance".into(),
                        ));
                    }
                }

                let eligible =
                    EligibilityService::can_mark(db, student_id, request.course_id, now).await?;

                if let Some(device) = device_info {
                    self.check_device(db, &eligible.course, student_id, device, now)
                        .await?;
                    if let Some(point) = device.location {
                        self.check_location(db, &eligible.course, student_id, device, point, now)
                            .await?;
                    }
                }

                let mark = Mark {
                    status: *status,
                    method: ValidationMethod::Manual,
                    device: device_info.as_ref(),
                };
                self.record(db, &eligible, principal, mark, now).await
            }

            ValidationPayload::Location {
                device_info,
                location,
            } => {
                self.require_self_service(principal, student_id)?;
                let eligible =
                    EligibilityService::can_mark(db, student_id, request.course_id, now).await?;

                self.check_device(db, &eligible.course, student_id, device_info, now)
                    .await?;
                self.check_location(db, &eligible.course, student_id, device_info, *location, now)
                    .await?;

                let mut device = device_info.clone();
                device.location = Some(*location);
                let mark = Mark {
                    status: AttendanceStatus::Present,
                    method: ValidationMethod::Location,
                    device: Some(&device),
                };
                self.record(db, &eligible, principal, mark, now).await
            }
        }
    }

    /// Amends how an existing record was validated.
    ///
    /// Status, timestamp, student and course never change here, and no device checks run.
    pub async fn revalidate(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        record_id: i64,
        method: ValidationMethod,
        device_info: Option<DeviceInfo>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let record = attendance_record::Entity::find_by_id(record_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                AttendanceError::NotFound(format!("attendance record {record_id} not found"))
            })?;

        EligibilityService::can_manage_course(db, principal, record.course_id).await?;

        let amended = record
            .amend_validation(db, method, principal.id, device_info.as_ref())
            .await?;
        tracing::info!(record_id, validated_by = principal.id, %method, "attendance re-validated");
        Ok(amended)
    }

    fn require_self_service(
        &self,
        principal: &Principal,
        student_id: i64,
    ) -> Result<(), AttendanceError> {
        if principal.is_student(student_id) {
            Ok(())
        } else {
            Err(AttendanceError::NotAuthorizedToValidate(
                "students may only mark their own attendance".into(),
            ))
        }
    }

    /// Known-device check followed by the device-sharing check. Either failure alerts
    /// the course's teacher before rejecting.
    async fn check_device(
        &self,
        db: &DatabaseConnection,
        course: &Course,
        student_id: i64,
        device: &DeviceInfo,
        now: DateTime<Utc>,
    ) -> Result<(), AttendanceError> {
        if !DeviceFingerprintService::is_authorized(db, student_id, device).await? {
            self.alert(db, course, student_id, device, FraudReason::UnauthorizedDevice, now)
                .await;
            return Err(AttendanceError::DeviceUnauthorized);
        }

        if FraudService::is_suspicious(db, &self.fraud, student_id, device, now).await? {
            self.alert(db, course, student_id, device, FraudReason::SuspiciousDevice, now)
                .await;
            return Err(AttendanceError::DeviceSuspicious);
        }

        Ok(())
    }

    /// Proximity check against the course's school. A position outside the radius alerts
    /// the course's teacher, with the position attached to the reported device.
    async fn check_location(
        &self,
        db: &DatabaseConnection,
        course: &Course,
        student_id: i64,
        device: &DeviceInfo,
        point: GeoPoint,
        now: DateTime<Utc>,
    ) -> Result<(), AttendanceError> {
        if LocationService::is_location_valid(db, course, point, self.school_radius_m).await? {
            return Ok(());
        }

        let mut reported = device.clone();
        reported.location = Some(point);
        self.alert(db, course, student_id, &reported, FraudReason::LocationMismatch, now)
            .await;
        Err(AttendanceError::LocationInvalid)
    }

    async fn alert(
        &self,
        db: &DatabaseConnection,
        course: &Course,
        student_id: i64,
        device: &DeviceInfo,
        reason: FraudReason,
        now: DateTime<Utc>,
    ) {
        let raised =
            NotificationService::raise_fraud_alert(db, course, student_id, device, reason, now)
                .await;
        if let Err(e) = raised {
            tracing::warn!(
                course_id = course.id,
                student_id,
                ?reason,
                error = %e,
                "failed to raise fraud alert"
            );
        }
    }

    async fn record(
        &self,
        db: &DatabaseConnection,
        eligible: &Eligible,
        principal: &Principal,
        mark: Mark<'_>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let created = AttendanceRecord::create(
            db,
            NewAttendanceRecord {
                student_id: eligible.student.id,
                course_id: eligible.course.id,
                marked_at: now,
                status: mark.status,
                validation_method: mark.method,
                validated_by_id: Some(principal.id),
                device_info: mark.device.cloned(),
            },
        )
        .await;

        let record = match created {
            Ok(record) => record,
            // lost a race with a concurrent mark for the same day
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(AttendanceError::AlreadyMarked);
            }
            Err(e) => return Err(e.into()),
        };

        if mark.status == AttendanceStatus::Absent {
            let (student, course) = (&eligible.student, &eligible.course);
            let notified =
                NotificationService::notify_parents_of_absence(db, student, course).await;
            if let Err(e) = notified {
                tracing::warn!(
                    record_id = record.id,
                    error = %e,
                    "failed to notify parents of absence"
                );
            }
        }

        Ok(record)
    }
}
