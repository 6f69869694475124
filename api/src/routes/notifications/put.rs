use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::notification::Model as Notification;

use super::common::{MarkAllReadResponse, NotificationResponse, error_response, internal_error};
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// PUT /api/notifications/{notification_id}/read
///
/// Marks one of the caller's notifications as read. Marking an already read
/// notification again is a no-op.
///
/// ### Responses
/// - `200 OK` with the updated notification
/// - `404 Not Found` if it does not exist or belongs to another user
pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Response {
    match Notification::mark_read(state.db(), claims.sub, notification_id).await {
        Ok(Some(updated)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                NotificationResponse::from(updated),
                "Notification marked as read",
            )),
        )
            .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Notification not found"),
        Err(e) => internal_error(e, "failed to mark notification as read"),
    }
}

/// PUT /api/notifications/read-all
///
/// Marks every unread notification of the caller as read.
///
/// ### Responses
/// - `200 OK` with `{ "updated": <count> }`
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Response {
    match Notification::mark_all_read(state.db(), claims.sub).await {
        Ok(updated) => {
            tracing::debug!(user_id = claims.sub, updated, "inbox marked as read");
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    MarkAllReadResponse { updated },
                    "All notifications marked as read",
                )),
            )
                .into_response()
        }
        Err(e) => internal_error(e, "failed to mark notifications as read"),
    }
}
