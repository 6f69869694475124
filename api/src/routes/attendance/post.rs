use axum::{
    Extension, Json,
    extract::{ConnectInfo, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use services::attendance_validation::{ValidationPayload, ValidationRequest};
use services::error::{AttendanceError, ValidationOutcome};
use std::net::SocketAddr;

use super::common::{
    GenerateQrReq, ManualMarkReq, OutcomeResponse, QrCodeResponse, ValidateLocationReq,
    ValidateQrReq, json_body, outcome_response,
};
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /api/attendance/qr/generate
///
/// Issues a signed QR code for a course. Teacher of the course or admin only.
///
/// ```json
/// { "courseId": 12 }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ qrCode, courseId, timestamp, expiresAt }`
/// - `400` `INVALID_INPUT`
/// - `403` `NOT_AUTHORIZED_TO_VALIDATE` (not the course's teacher)
/// - `404` `NOT_FOUND` (unknown course)
///
/// Failures carry the usual outcome in `data`, so `data.errorCode` is always present.
pub async fn generate_qr(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    body: Result<Json<GenerateQrReq>, JsonRejection>,
) -> Response {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(rejection) => return rejection.into_response(),
    };

    let issued = state
        .attendance()
        .generate_qr(state.db(), &claims.principal(), body.course_id, Utc::now())
        .await;

    match issued {
        Ok(token) => {
            let data = QrCodeResponse::from(token);
            (StatusCode::OK, Json(ApiResponse::success(data, "QR code generated"))).into_response()
        }
        Err(e) => {
            if let AttendanceError::Internal(db_err) = &e {
                tracing::error!(
                    error = %db_err,
                    course_id = body.course_id,
                    "failed to generate QR code"
                );
            }
            outcome_response(ValidationOutcome::rejected(&e), StatusCode::OK, "").into_response()
        }
    }
}

/// POST /api/attendance/qr/validate
///
/// A student marks themselves present by submitting a scanned code.
///
/// ```json
/// {
///   "courseId": 12,
///   "qrCode": "12-1759741200000-9f86d0...",
///   "deviceInfo": {
///     "userAgent": "...", "platform": "...", "browser": "...", "version": "...", "os": "...",
///     "location": { "latitude": -25.7479, "longitude": 28.2293 }
///   }
/// }
/// ```
///
/// The device IP is always taken from the connection, never from the body. An optional
/// `deviceInfo.location` must fall inside the school's radius.
///
/// ### Responses
/// - `201 Created` with `data.accepted = true` and the new record
/// - `400` `INVALID_INPUT` / `INVALID_TOKEN` / `LOCATION_INVALID`
/// - `403` `DEVICE_UNAUTHORIZED` / `DEVICE_SUSPICIOUS` / `NOT_AUTHORIZED_TO_VALIDATE`
/// - `404` `INELIGIBLE`
/// - `409` `ALREADY_MARKED`
pub async fn validate_qr(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Result<Json<ValidateQrReq>, JsonRejection>,
) -> OutcomeResponse {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(rejection) => return rejection,
    };

    let request = ValidationRequest {
        student_id: claims.sub,
        course_id: body.course_id,
        principal: claims.principal(),
        payload: ValidationPayload::Qr {
            code: body.qr_code,
            device_info: body.device_info.into_device(Some(addr.ip().to_string())),
        },
    };

    let outcome = state.attendance().validate(state.db(), request, Utc::now()).await;
    outcome_response(outcome, StatusCode::CREATED, "Attendance recorded")
}

/// POST /api/attendance/location/validate
///
/// A student checks in from their current position.
///
/// ```json
/// {
///   "courseId": 12,
///   "deviceInfo": { ... },
///   "location": { "latitude": -25.7479, "longitude": 28.2293 }
/// }
/// ```
///
/// ### Responses
/// Same as `POST /qr/validate`, with `400 LOCATION_INVALID` when outside the school's radius.
pub async fn validate_location(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Result<Json<ValidateLocationReq>, JsonRejection>,
) -> OutcomeResponse {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(rejection) => return rejection,
    };

    let request = ValidationRequest {
        student_id: claims.sub,
        course_id: body.course_id,
        principal: claims.principal(),
        payload: ValidationPayload::Location {
            device_info: body.device_info.into_device(Some(addr.ip().to_string())),
            location: body.location.into(),
        },
    };

    let outcome = state.attendance().validate(state.db(), request, Utc::now()).await;
    outcome_response(outcome, StatusCode::CREATED, "Attendance recorded")
}

/// POST /api/attendance/manual
///
/// A teacher or admin records attendance for a student. Marking a student `ABSENT`
/// notifies every linked parent.
///
/// ```json
/// { "studentId": 7, "courseId": 12, "status": "ABSENT" }
/// ```
///
/// `deviceInfo` is optional; when present it goes through the same device and location
/// checks as the self-service flows. `status` must be one of `PRESENT`, `ABSENT` or
/// `EXCUSE`; anything else is `400 INVALID_INPUT`.
pub async fn mark_manually(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    body: Result<Json<ManualMarkReq>, JsonRejection>,
) -> OutcomeResponse {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(rejection) => return rejection,
    };

    let request = ValidationRequest {
        student_id: body.student_id,
        course_id: body.course_id,
        principal: claims.principal(),
        payload: ValidationPayload::Manual {
            status: body.status,
            device_info: body.device_info.map(|d| d.into_device(None)),
        },
    };

    let outcome = state.attendance().validate(state.db(), request, Utc::now()).await;
    outcome_response(outcome, StatusCode::CREATED, "Attendance recorded")
}
