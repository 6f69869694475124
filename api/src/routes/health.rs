use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{Json, Router, response::IntoResponse, routing::get};

/// Builds the `/health` route group.
///
/// The group holds one public `GET /health` endpoint that answers without touching the
/// database or requiring a token, so a load balancer can poll it cheaply.
///
/// # Returns
/// An Axum `Router` with the `GET /health` route configured, waiting for `AppState`.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// GET /health
///
/// Returns a fixed success envelope to show the API process is up and serving requests.
/// It says nothing about the database; a failing store still answers `200` here.
///
/// ### Response
/// - `200 OK`
///
/// ```json
/// {
///   "success": true,
///   "data": "OK",
///   "message": "Health check passed"
/// }
/// ```
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success("OK", "Health check passed"))
}
