use axum::{Json, extract::rejection::JsonRejection, http::StatusCode};
use chrono::{DateTime, Utc};
use db::device_info::{DeviceInfo, GeoPoint};
use db::models::attendance_record::{AttendanceStatus, ValidationMethod};
use serde::{Deserialize, Serialize};
use services::error::{AttendanceError, ErrorCode, ValidationOutcome};
use services::qr_token::IssuedToken;
use validator::Validate;

use crate::response::ApiResponse;
use crate::routes::common::format_validation_errors;

pub type OutcomeResponse = (StatusCode, Json<ApiResponse<ValidationOutcome>>);

/// Maps an error tag to its HTTP status.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidInput | ErrorCode::InvalidToken | ErrorCode::LocationInvalid => {
            StatusCode::BAD_REQUEST
        }
        ErrorCode::NotAuthorizedToValidate
        | ErrorCode::DeviceUnauthorized
        | ErrorCode::DeviceSuspicious => StatusCode::FORBIDDEN,
        ErrorCode::Ineligible | ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::AlreadyMarked => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wraps an outcome in the standard envelope, using `ok` as the status on acceptance.
pub fn outcome_response(
    outcome: ValidationOutcome,
    ok: StatusCode,
    ok_message: &str,
) -> OutcomeResponse {
    match (outcome.error_code, outcome.error_message.clone()) {
        (Some(code), message) => (
            status_for(code),
            Json(ApiResponse::new(false, outcome, message.unwrap_or_default())),
        ),
        (None, _) => (ok, Json(ApiResponse::new(true, outcome, ok_message))),
    }
}

/// Wraps an error in the standard envelope, with its tag in `data.errorCode`.
pub fn rejection_response(err: &AttendanceError) -> OutcomeResponse {
    outcome_response(ValidationOutcome::rejected(err), StatusCode::BAD_REQUEST, "")
}

/// Runs `validator` on a request body, turning failures into an `INVALID_INPUT` outcome.
pub fn validate_body<T: Validate>(body: &T) -> Result<(), OutcomeResponse> {
    body.validate().map_err(|e| {
        rejection_response(&AttendanceError::InvalidInput(format_validation_errors(&e)))
    })
}

/// Unwraps a JSON body and validates it.
///
/// Bodies that do not parse (missing fields, wrong types, unknown enum values or a
/// missing `Content-Type`) end up as `INVALID_INPUT` like any other bad input, instead of
/// axum's plain-text rejection.
pub fn json_body<T: Validate>(body: Result<Json<T>, JsonRejection>) -> Result<T, OutcomeResponse> {
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected request body");
        rejection_response(&AttendanceError::InvalidInput(rejection.body_text()))
    })?;
    validate_body(&body)?;
    Ok(body)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfoReq {
    #[validate(length(min = 1, max = 512, message = "deviceInfo.userAgent is required"))]
    pub user_agent: String,
    #[validate(length(min = 1, max = 128, message = "deviceInfo.platform is required"))]
    pub platform: String,
    #[validate(length(min = 1, max = 128, message = "deviceInfo.browser is required"))]
    pub browser: String,
    #[validate(length(max = 64, message = "deviceInfo.version is too long"))]
    #[serde(default)]
    pub version: String,
    #[validate(length(min = 1, max = 128, message = "deviceInfo.os is required"))]
    pub os: String,
    #[validate(length(max = 64, message = "deviceInfo.ip is too long"))]
    pub ip: Option<String>,
    /// Position reported alongside the device, checked against the school when present.
    #[validate(nested)]
    pub location: Option<LocationReq>,
}

impl DeviceInfoReq {
    /// `ip` overrides whatever the client reported.
    pub fn into_device(self, ip: Option<String>) -> DeviceInfo {
        DeviceInfo {
            user_agent: self.user_agent,
            platform: self.platform,
            browser: self.browser,
            version: self.version,
            os: self.os,
            ip: ip.or(self.ip).unwrap_or_default(),
            location: self.location.map(GeoPoint::from),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct LocationReq {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "longitude must be between -180 and 180"
    ))]
    pub longitude: f64,
}

impl From<LocationReq> for GeoPoint {
    fn from(l: LocationReq) -> Self {
        GeoPoint {
            latitude: l.latitude,
            longitude: l.longitude,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQrReq {
    #[validate(range(min = 1, message = "courseId must be a positive id"))]
    pub course_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    pub qr_code: String,
    pub course_id: i64,
    /// Issue time in epoch milliseconds, as embedded in the code.
    pub timestamp: i64,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for QrCodeResponse {
    fn from(t: IssuedToken) -> Self {
        Self {
            qr_code: t.code,
            course_id: t.course_id,
            timestamp: t.issued_at.timestamp_millis(),
            expires_at: t.expires_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateQrReq {
    #[validate(range(min = 1, message = "courseId must be a positive id"))]
    pub course_id: i64,
    #[validate(length(min = 1, max = 256, message = "qrCode is required"))]
    pub qr_code: String,
    #[validate(nested)]
    pub device_info: DeviceInfoReq,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateLocationReq {
    #[validate(range(min = 1, message = "courseId must be a positive id"))]
    pub course_id: i64,
    #[validate(nested)]
    pub device_info: DeviceInfoReq,
    #[validate(nested)]
    pub location: LocationReq,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualMarkReq {
    #[validate(range(min = 1, message = "studentId must be a positive id"))]
    pub student_id: i64,
    #[validate(range(min = 1, message = "courseId must be a positive id"))]
    pub course_id: i64,
    pub status: AttendanceStatus,
    #[validate(nested)]
    pub device_info: Option<DeviceInfoReq>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RevalidateReq {
    pub validation_method: Option<ValidationMethod>,
    #[validate(nested)]
    pub device_info: Option<DeviceInfoReq>,
}
