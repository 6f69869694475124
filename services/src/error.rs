use db::models::attendance_record::Model as AttendanceRecord;
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Stable, machine-readable tag for every way a validation attempt can end badly.
///
/// Callers branch on this, never on the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    Ineligible,
    InvalidToken,
    DeviceUnauthorized,
    DeviceSuspicious,
    LocationInvalid,
    AlreadyMarked,
    NotAuthorizedToValidate,
    NotFound,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::Ineligible => "INELIGIBLE",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::DeviceUnauthorized => "DEVICE_UNAUTHORIZED",
            ErrorCode::DeviceSuspicious => "DEVICE_SUSPICIOUS",
            ErrorCode::LocationInvalid => "LOCATION_INVALID",
            ErrorCode::AlreadyMarked => "ALREADY_MARKED",
            ErrorCode::NotAuthorizedToValidate => "NOT_AUTHORIZED_TO_VALIDATE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Ineligible(String),

    /// Covers bad signatures, expired windows and malformed codes alike.
    #[error("QR code is invalid or expired")]
    InvalidToken,

    #[error("device is not authorized for this student")]
    DeviceUnauthorized,

    #[error("suspicious device activity detected")]
    DeviceSuspicious,

    #[error("location is outside the school's attendance area")]
    LocationInvalid,

    #[error("attendance has already been recorded for this course today")]
    AlreadyMarked,

    #[error("{0}")]
    NotAuthorizedToValidate(String),

    #[error("{0}")]
    NotFound(String),

    /// The wrapped error is logged, never shown.
    #[error("an internal error occurred")]
    Internal(#[from] DbErr),
}

impl AttendanceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AttendanceError::InvalidInput(_) => ErrorCode::InvalidInput,
            AttendanceError::Ineligible(_) => ErrorCode::Ineligible,
            AttendanceError::InvalidToken => ErrorCode::InvalidToken,
            AttendanceError::DeviceUnauthorized => ErrorCode::DeviceUnauthorized,
            AttendanceError::DeviceSuspicious => ErrorCode::DeviceSuspicious,
            AttendanceError::LocationInvalid => ErrorCode::LocationInvalid,
            AttendanceError::AlreadyMarked => ErrorCode::AlreadyMarked,
            AttendanceError::NotAuthorizedToValidate(_) => ErrorCode::NotAuthorizedToValidate,
            AttendanceError::NotFound(_) => ErrorCode::NotFound,
            AttendanceError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// What the core hands back to its callers for every validation attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AttendanceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationOutcome {
    pub fn accepted(record: AttendanceRecord) -> Self {
        Self {
            accepted: true,
            record: Some(record),
            error_code: None,
            error_message: None,
        }
    }

    pub fn rejected(err: &AttendanceError) -> Self {
        Self {
            accepted: false,
            record: None,
            error_code: Some(err.code()),
            error_message: Some(err.to_string()),
        }
    }
}

impl From<Result<AttendanceRecord, AttendanceError>> for ValidationOutcome {
    fn from(result: Result<AttendanceRecord, AttendanceError>) -> Self {
        match result {
            Ok(record) => ValidationOutcome::accepted(record),
            Err(err) => ValidationOutcome::rejected(&err),
        }
    }
}
