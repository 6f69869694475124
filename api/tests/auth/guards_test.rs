use api::auth::generate_jwt;
use axum::{
    body::Body as AxumBody,
    http::{Request, StatusCode},
};
use db::models::user::Role;
use tower::ServiceExt;

use crate::helpers::{body_json, make_test_app};

fn post_as(role: Role, uri: &str) -> Request<AxumBody> {
    let (token, _) = generate_jwt(1, role).unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(AxumBody::from(r#"{"courseId": 1}"#))
        .unwrap()
}

#[tokio::test]
async fn staff_routes_turn_away_students_and_parents() {
    let (app, _state) = make_test_app().await;

    for role in [Role::Student, Role::Parent] {
        let response = app
            .clone()
            .oneshot(post_as(role, "/api/attendance/qr/generate"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Teacher or admin access required");
    }
}

#[tokio::test]
async fn student_routes_turn_away_staff() {
    let (app, _state) = make_test_app().await;

    for role in [Role::Teacher, Role::Admin] {
        let response = app
            .clone()
            .oneshot(post_as(role, "/api/attendance/location/validate"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["message"], "Student access required");
    }
}

#[tokio::test]
async fn anonymous_requests_need_authentication() {
    let (app, _state) = make_test_app().await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/attendance/manual")
        .header("Content-Type", "application/json")
        .body(AxumBody::from("{}"))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Authentication required");
}
