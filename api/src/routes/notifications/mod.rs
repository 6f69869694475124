//! The caller's own notification inbox: absence notices for parents and fraud alerts for
//! staff. Every route is scoped to the authenticated user.

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

mod common;
mod get;
mod put;

pub use get::list_notifications;
pub use put::{mark_all_read, mark_read};

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/read-all", put(mark_all_read))
        .route("/{notification_id}/read", put(mark_read))
}
