//! HTTP route entry point for `/api/...`.
//!
//! - `/health` → Health check endpoint (public)
//! - `/attendance` → QR, location and manual attendance validation (authenticated users)
//! - `/notifications` → The caller's own inbox (authenticated users)

use crate::auth::guards::allow_authenticated;
use crate::routes::{
    attendance::attendance_routes, health::health_routes, notifications::notification_routes,
};
use crate::state::AppState;
use axum::{Router, middleware::from_fn};

pub mod attendance;
pub mod common;
pub mod health;
pub mod notifications;

/// Builds the router for every HTTP endpoint, with `app_state` already applied.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/attendance",
            attendance_routes().route_layer(from_fn(allow_authenticated)),
        )
        .nest(
            "/notifications",
            notification_routes().route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
