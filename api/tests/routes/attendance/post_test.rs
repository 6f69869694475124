use api::auth::generate_jwt;
use axum::{
    body::Body as AxumBody,
    http::{Request, StatusCode},
};
use db::device_info::GeoPoint;
use db::models::{
    class::Model as ClassModel,
    course::Model as CourseModel,
    notification::{Model as NotificationModel, NotificationType},
    parent_child::Model as ParentChildModel,
    school::Model as SchoolModel,
    user::{Model as UserModel, Role},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::helpers::{TestApp, body_json, make_test_app, with_connect_info};

const SCHOOL: GeoPoint = GeoPoint {
    latitude: -25.7545,
    longitude: 28.2314,
};

struct TestCtx {
    teacher: UserModel,
    other_teacher: UserModel,
    student: UserModel,
    parent: UserModel,
    course: CourseModel,
}

async fn setup(db: &DatabaseConnection) -> TestCtx {
    let school = SchoolModel::create(db, "Hatfield Primary", Some(SCHOOL), Some(200.0))
        .await
        .unwrap();
    let class = ClassModel::create(db, school.id, "7B").await.unwrap();
    let teacher = UserModel::create(db, "Ms Dlamini", "dlamini@test.com", Role::Teacher, None)
        .await
        .unwrap();
    let other_teacher = UserModel::create(db, "Mr Smit", "smit@test.com", Role::Teacher, None)
        .await
        .unwrap();
    let student = UserModel::create(db, "Thabo", "thabo@test.com", Role::Student, Some(class.id))
        .await
        .unwrap();
    let parent = UserModel::create(db, "Thabo's mother", "mother@test.com", Role::Parent, None)
        .await
        .unwrap();
    ParentChildModel::link(db, parent.id, student.id).await.unwrap();
    let course = CourseModel::create(db, class.id, Some(teacher.id), "Natural Sciences")
        .await
        .unwrap();

    TestCtx {
        teacher,
        other_teacher,
        student,
        parent,
        course,
    }
}

fn token_for(user: &UserModel) -> String {
    generate_jwt(user.id, user.role).unwrap().0
}

fn post(uri: &str, token: &str, body: Value) -> Request<AxumBody> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(AxumBody::from(body.to_string()))
        .unwrap()
}

fn device() -> Value {
    json!({
        "userAgent": "Mozilla/5.0 (Linux; Android 14)",
        "platform": "Linux armv8l",
        "browser": "Chrome",
        "version": "128.0",
        "os": "Android",
        "ip": "1.2.3.4"
    })
}

// ---------------------------
// qr/generate
// ---------------------------

#[tokio::test]
async fn teacher_generates_qr_for_own_course() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let req = post(
        "/api/attendance/qr/generate",
        &token_for(&ctx.teacher),
        json!({ "courseId": ctx.course.id }),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["courseId"], ctx.course.id);
    let code = json["data"]["qrCode"].as_str().unwrap();
    assert!(code.starts_with(&format!("{}-", ctx.course.id)));
    assert_eq!(
        code.split('-').nth(1).unwrap(),
        json["data"]["timestamp"].as_i64().unwrap().to_string()
    );
}

#[tokio::test]
async fn generate_qr_rejects_other_teachers_and_unknown_courses() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let req = post(
        "/api/attendance/qr/generate",
        &token_for(&ctx.other_teacher),
        json!({ "courseId": ctx.course.id }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["errorCode"], "NOT_AUTHORIZED_TO_VALIDATE");

    let req = post(
        "/api/attendance/qr/generate",
        &token_for(&ctx.teacher),
        json!({ "courseId": 9999 }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["data"]["errorCode"], "NOT_FOUND");

    let req = post(
        "/api/attendance/qr/generate",
        &token_for(&ctx.student),
        json!({ "courseId": ctx.course.id }),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn generate_qr_without_course_id_is_invalid_input() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let req = post("/api/attendance/qr/generate", &token_for(&ctx.teacher), json!({}));
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["accepted"], false);
    assert_eq!(json["data"]["errorCode"], "INVALID_INPUT");
    assert!(json["message"].as_str().unwrap().contains("courseId"));
}

// ---------------------------
// qr/validate
// ---------------------------

async fn issue_code(app: &TestApp, ctx: &TestCtx) -> String {
    let req = post(
        "/api/attendance/qr/generate",
        &token_for(&ctx.teacher),
        json!({ "courseId": ctx.course.id }),
    );
    let json = body_json(app.clone().oneshot(req).await.unwrap()).await;
    json["data"]["qrCode"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn student_scan_is_recorded_once() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;
    let code = issue_code(&app, &ctx).await;
    let token = token_for(&ctx.student);
    let body = json!({ "courseId": ctx.course.id, "qrCode": code, "deviceInfo": device() });

    let req = post("/api/attendance/qr/validate", &token, body.clone());
    let req = with_connect_info(req, [198, 51, 100, 9]);
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["accepted"], true);
    let record = &json["data"]["record"];
    assert_eq!(record["studentId"], ctx.student.id);
    assert_eq!(record["status"], "PRESENT");
    assert_eq!(record["validationMethod"], "QR");
    // the peer address wins over the reported one
    let stored: Value = serde_json::from_str(record["deviceInfo"].as_str().unwrap()).unwrap();
    assert_eq!(stored["ip"], "198.51.100.9");

    let req = post("/api/attendance/qr/validate", &token, body);
    let req = with_connect_info(req, [198, 51, 100, 9]);
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["accepted"], false);
    assert_eq!(json["data"]["errorCode"], "ALREADY_MARKED");
}

#[tokio::test]
async fn tampered_code_is_invalid_token() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;
    let code = issue_code(&app, &ctx).await;
    let prefix = format!("{}-", ctx.course.id);
    let tampered = code.replacen(&prefix, &format!("{}-", ctx.course.id + 1), 1);

    let req = with_connect_info(
        post(
            "/api/attendance/qr/validate",
            &token_for(&ctx.student),
            json!({ "courseId": ctx.course.id, "qrCode": tampered, "deviceInfo": device() }),
        ),
        [10, 0, 0, 1],
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["data"]["errorCode"], "INVALID_TOKEN");
}

#[tokio::test]
async fn missing_device_fields_are_invalid_input() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;
    let mut bad_device = device();
    bad_device["userAgent"] = json!("");

    let req = with_connect_info(
        post(
            "/api/attendance/qr/validate",
            &token_for(&ctx.student),
            json!({ "courseId": ctx.course.id, "qrCode": "1-2-ab", "deviceInfo": bad_device }),
        ),
        [10, 0, 0, 1],
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["data"]["errorCode"], "INVALID_INPUT");
    assert!(json["message"].as_str().unwrap().contains("userAgent"));
}

#[tokio::test]
async fn scan_reporting_a_distant_position_is_location_invalid() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;
    let code = issue_code(&app, &ctx).await;
    let mut far_device = device();
    far_device["location"] = json!({
        "latitude": SCHOOL.latitude + 1.0,
        "longitude": SCHOOL.longitude
    });

    let req = with_connect_info(
        post(
            "/api/attendance/qr/validate",
            &token_for(&ctx.student),
            json!({ "courseId": ctx.course.id, "qrCode": code, "deviceInfo": far_device }),
        ),
        [10, 0, 0, 1],
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["data"]["errorCode"], "LOCATION_INVALID");

    let alerts = NotificationModel::for_user(app_state.db(), ctx.teacher.id).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].notification_type, NotificationType::Alert);
}

#[tokio::test]
async fn scan_body_that_does_not_parse_is_invalid_input() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let req = with_connect_info(
        post(
            "/api/attendance/qr/validate",
            &token_for(&ctx.student),
            json!({ "courseId": "twelve", "qrCode": "1-2-ab", "deviceInfo": device() }),
        ),
        [10, 0, 0, 1],
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["data"]["errorCode"], "INVALID_INPUT");
}

#[tokio::test]
async fn scanning_requires_authentication_and_student_role() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;
    let body = json!({ "courseId": ctx.course.id, "qrCode": "x", "deviceInfo": device() });

    let req = Request::builder()
        .method("POST")
        .uri("/api/attendance/qr/validate")
        .header("Content-Type", "application/json")
        .body(AxumBody::from(body.to_string()))
        .unwrap();
    let req = with_connect_info(req, [10, 0, 0, 1]);
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let req = with_connect_info(
        post("/api/attendance/qr/validate", &token_for(&ctx.teacher), body),
        [10, 0, 0, 1],
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------
// location/validate
// ---------------------------

#[tokio::test]
async fn location_check_in_respects_the_school_radius() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;
    let token = token_for(&ctx.student);

    let far = json!({ "latitude": SCHOOL.latitude + 0.05, "longitude": SCHOOL.longitude });
    let req = with_connect_info(
        post(
            "/api/attendance/location/validate",
            &token,
            json!({ "courseId": ctx.course.id, "deviceInfo": device(), "location": far }),
        ),
        [10, 0, 0, 1],
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["data"]["errorCode"], "LOCATION_INVALID");

    let near = json!({ "latitude": SCHOOL.latitude, "longitude": SCHOOL.longitude });
    let req = with_connect_info(
        post(
            "/api/attendance/location/validate",
            &token,
            json!({ "courseId": ctx.course.id, "deviceInfo": device(), "location": near }),
        ),
        [10, 0, 0, 1],
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["record"]["validationMethod"], "LOCATION");
}

#[tokio::test]
async fn out_of_range_coordinates_are_invalid_input() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let req = with_connect_info(
        post(
            "/api/attendance/location/validate",
            &token_for(&ctx.student),
            json!({
                "courseId": ctx.course.id,
                "deviceInfo": device(),
                "location": { "latitude": 123.0, "longitude": 0.0 }
            }),
        ),
        [10, 0, 0, 1],
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["data"]["errorCode"], "INVALID_INPUT");
}

// ---------------------------
// manual
// ---------------------------

#[tokio::test]
async fn manual_absence_notifies_the_parent() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let req = post(
        "/api/attendance/manual",
        &token_for(&ctx.teacher),
        json!({ "studentId": ctx.student.id, "courseId": ctx.course.id, "status": "ABSENT" }),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["record"]["status"], "ABSENT");
    assert_eq!(json["data"]["record"]["validationMethod"], "MANUAL");
    assert_eq!(json["data"]["record"]["validatedById"], ctx.teacher.id);

    let inbox = NotificationModel::for_user(app_state.db(), ctx.parent.id).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].notification_type, NotificationType::Absence);
    assert!(inbox[0].message.contains("Natural Sciences"));
}

#[tokio::test]
async fn manual_mark_by_another_teacher_is_not_authorized() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let req = post(
        "/api/attendance/manual",
        &token_for(&ctx.other_teacher),
        json!({ "studentId": ctx.student.id, "courseId": ctx.course.id, "status": "PRESENT" }),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["data"]["errorCode"], "NOT_AUTHORIZED_TO_VALIDATE");
}

#[tokio::test]
async fn manual_mark_with_unknown_status_is_invalid_input() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let req = post(
        "/api/attendance/manual",
        &token_for(&ctx.teacher),
        json!({ "studentId": ctx.student.id, "courseId": ctx.course.id, "status": "LATE" }),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["errorCode"], "INVALID_INPUT");

    let inbox = NotificationModel::for_user(app_state.db(), ctx.parent.id).await.unwrap();
    assert!(inbox.is_empty());
}
