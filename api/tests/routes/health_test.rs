use axum::{
    body::Body as AxumBody,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use crate::helpers::{body_json, make_test_app};

#[tokio::test]
async fn health_check_returns_ok_json() {
    let (app, _state) = make_test_app().await;

    let req = Request::builder()
        .method("GET")
        .uri("/api/health")
        .body(AxumBody::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], "OK");
    assert_eq!(json["message"], "Health check passed");
}
