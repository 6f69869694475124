use axum::{
    Router,
    middleware::from_fn,
    routing::{post, put},
};

use crate::auth::guards::{allow_staff, allow_student};
use crate::state::AppState;

mod common;
mod post;
mod put;

pub use post::{generate_qr, mark_manually, validate_location, validate_qr};
pub use put::revalidate;

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/qr/generate", post(generate_qr).route_layer(from_fn(allow_staff)))
        .route("/qr/validate", post(validate_qr).route_layer(from_fn(allow_student)))
        .route("/location/validate", post(validate_location).route_layer(from_fn(allow_student)))
        .route("/manual", post(mark_manually).route_layer(from_fn(allow_staff)))
        .route("/{attendance_id}/validate", put(revalidate).route_layer(from_fn(allow_staff)))
}
