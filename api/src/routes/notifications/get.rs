use axum::{
    Extension, Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::notification::{InboxFilter, Model as Notification};

use super::common::{
    InboxQuery, InboxResponse, NotificationResponse, error_response, internal_error,
};
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

/// GET /api/notifications
///
/// Lists the caller's notifications, newest first.
///
/// ### Query Parameters
/// - `page` (optional, default 1)
/// - `per_page` (optional, default 20, max 100)
/// - `status` (optional): `SENT` (unread) or `READ`
/// - `type` (optional): `GENERAL`, `ABSENCE` or `ALERT`
///
/// ### Responses
/// - `200 OK` with `{ notifications, page, perPage, total, unreadCount }`;
///   `unreadCount` ignores the filters
/// - `400 Bad Request` for an unknown `status`/`type` or a non-numeric page
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    query: Result<Query<InboxQuery>, QueryRejection>,
) -> Response {
    let Query(params) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let db = state.db();
    let user_id = claims.sub;
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let filter = InboxFilter {
        status: params.status,
        notification_type: params.notification_type,
    };

    let (items, total) =
        match Notification::page_for_user(db, user_id, filter, page, per_page).await {
            Ok(found) => found,
            Err(e) => return internal_error(e, "failed to list notifications"),
        };
    let unread_count = match Notification::unread_count(db, user_id).await {
        Ok(n) => n,
        Err(e) => return internal_error(e, "failed to count unread notifications"),
    };

    let response = InboxResponse {
        notifications: items.into_iter().map(NotificationResponse::from).collect(),
        page,
        per_page,
        total,
        unread_count,
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(response, "Notifications retrieved")),
    )
        .into_response()
}
