use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use db::models::attendance_record::ValidationMethod;
use services::error::{AttendanceError, ValidationOutcome};

use super::common::{OutcomeResponse, RevalidateReq, json_body, outcome_response};
use crate::auth::AuthUser;
use crate::state::AppState;

/// PUT /api/attendance/{attendance_id}/validate
///
/// Re-validates an existing record. Only `validationMethod`, `validatedById` (set to
/// the caller) and `deviceInfo` change. Teacher of the course or admin only.
///
/// ```json
/// { "validationMethod": "MANUAL" }
/// ```
///
/// `validationMethod` defaults to `MANUAL`; omitting `deviceInfo` keeps the stored one.
///
/// ### Responses
/// - `200 OK` with the amended record
/// - `400` `INVALID_INPUT` (e.g. an unknown `validationMethod`)
/// - `403` `NOT_AUTHORIZED_TO_VALIDATE`
/// - `404` `NOT_FOUND`
pub async fn revalidate(
    State(state): State<AppState>,
    Path(attendance_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    body: Result<Json<RevalidateReq>, JsonRejection>,
) -> OutcomeResponse {
    let body = match json_body(body) {
        Ok(body) => body,
        Err(rejection) => return rejection,
    };

    let result = state
        .attendance()
        .revalidate(
            state.db(),
            &claims.principal(),
            attendance_id,
            body.validation_method.unwrap_or(ValidationMethod::Manual),
            body.device_info.map(|d| d.into_device(None)),
        )
        .await;

    match &result {
        Err(AttendanceError::Internal(db_err)) => {
            tracing::error!(attendance_id, error = %db_err, "re-validation failed")
        }
        Err(e) => tracing::info!(attendance_id, code = %e.code(), "re-validation rejected"),
        Ok(_) => {}
    }

    let outcome = ValidationOutcome::from(result);
    outcome_response(outcome, StatusCode::OK, "Attendance re-validated")
}
