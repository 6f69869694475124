use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use db::models::notification::{Model as Notification, NotificationStatus, NotificationType};
use serde::{Deserialize, Serialize};

use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    pub page: Option<u64>,
    #[serde(alias = "perPage")]
    pub per_page: Option<u64>,
    pub status: Option<NotificationStatus>,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub status: NotificationStatus,
    /// Parsed back into JSON when the stored context is valid JSON.
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            message: n.message,
            notification_type: n.notification_type,
            status: n.status,
            metadata: n.metadata.map(|raw| {
                serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
            }),
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxResponse {
    pub notifications: Vec<NotificationResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub unread_count: u64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

pub fn internal_error(err: sea_orm::DbErr, context: &'static str) -> Response {
    tracing::error!(error = %err, "{context}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
