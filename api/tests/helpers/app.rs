use api::{auth::middleware::log_request, routes::routes, state::AppState};
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::from_fn,
    response::Response,
};
use db::test_utils::setup_test_db;
use once_cell::sync::Lazy;
use serde_json::Value;
use services::attendance_validation::AttendanceValidationService;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tower::ServiceExt;
use tower::util::BoxCloneService;
use util::config::AppConfig;

static TEST_ENV: Lazy<()> = Lazy::new(|| unsafe {
    std::env::set_var("DATABASE_PATH", "sqlite::memory:");
    std::env::set_var("JWT_SECRET", "api-test-jwt-secret");
    std::env::set_var("QR_SECRET", "api-test-qr-secret");
});

pub type TestApp = BoxCloneService<Request<Body>, Response, Infallible>;

/// Router over a fresh in-memory database, plus the state it runs on.
pub async fn make_test_app() -> (TestApp, AppState) {
    Lazy::force(&TEST_ENV);

    let db = setup_test_db().await;
    let attendance = AttendanceValidationService::from_config(&AppConfig::global()).unwrap();
    let app_state = AppState::new(db, attendance);

    let router = Router::new()
        .nest("/api", routes(app_state.clone()))
        .layer(from_fn(log_request));

    (router.into_service().boxed_clone(), app_state)
}

/// Attaches a peer address the way `into_make_service_with_connect_info` would.
pub fn with_connect_info(mut req: Request<Body>, ip: [u8; 4]) -> Request<Body> {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::from(ip)), 43210);
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
