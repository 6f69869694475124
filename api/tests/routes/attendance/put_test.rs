use api::auth::generate_jwt;
use axum::{
    body::Body as AxumBody,
    http::{Request, StatusCode},
};
use chrono::Utc;
use db::models::{
    attendance_record::{
        AttendanceStatus, Model as AttendanceModel, NewAttendanceRecord, ValidationMethod,
    },
    class::Model as ClassModel,
    course::Model as CourseModel,
    school::Model as SchoolModel,
    user::{Model as UserModel, Role},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::helpers::{body_json, make_test_app};

struct TestCtx {
    admin: UserModel,
    teacher: UserModel,
    other_teacher: UserModel,
    student: UserModel,
    record: AttendanceModel,
}

async fn setup(db: &DatabaseConnection) -> TestCtx {
    let school = SchoolModel::create(db, "Lynnwood High", None, None).await.unwrap();
    let class = ClassModel::create(db, school.id, "9A").await.unwrap();
    let admin = UserModel::create(db, "Admin", "admin@test.com", Role::Admin, None)
        .await
        .unwrap();
    let teacher = UserModel::create(db, "Ms Naidoo", "naidoo@test.com", Role::Teacher, None)
        .await
        .unwrap();
    let other_teacher = UserModel::create(db, "Mr Botha", "botha@test.com", Role::Teacher, None)
        .await
        .unwrap();
    let student = UserModel::create(db, "Lerato", "lerato@test.com", Role::Student, Some(class.id))
        .await
        .unwrap();
    let course = CourseModel::create(db, class.id, Some(teacher.id), "Geography")
        .await
        .unwrap();

    let record = AttendanceModel::create(
        db,
        NewAttendanceRecord {
            student_id: student.id,
            course_id: course.id,
            marked_at: Utc::now(),
            status: AttendanceStatus::Present,
            validation_method: ValidationMethod::Qr,
            validated_by_id: Some(student.id),
            device_info: None,
        },
    )
    .await
    .unwrap();

    TestCtx {
        admin,
        teacher,
        other_teacher,
        student,
        record,
    }
}

fn put(uri: &str, user: &UserModel, body: Value) -> Request<AxumBody> {
    let (token, _) = generate_jwt(user.id, user.role).unwrap();
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(AxumBody::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn teacher_revalidates_a_record_manually() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let uri = format!("/api/attendance/{}/validate", ctx.record.id);
    let response = app.oneshot(put(&uri, &ctx.teacher, json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    let record = &json["data"]["record"];
    assert_eq!(record["validationMethod"], "MANUAL");
    assert_eq!(record["validatedById"], ctx.teacher.id);
    assert_eq!(record["status"], "PRESENT");
}

#[tokio::test]
async fn admin_can_attach_a_device_on_revalidation() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let uri = format!("/api/attendance/{}/validate", ctx.record.id);
    let body = json!({
        "validationMethod": "LOCATION",
        "deviceInfo": {
            "userAgent": "Mozilla/5.0 (iPad)",
            "platform": "iPad",
            "browser": "Safari",
            "version": "17.5",
            "os": "iPadOS",
            "ip": "10.1.1.1"
        }
    });
    let response = app.oneshot(put(&uri, &ctx.admin, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["record"]["validationMethod"], "LOCATION");
    let raw = json["data"]["record"]["deviceInfo"].as_str().unwrap();
    let stored: Value = serde_json::from_str(raw).unwrap();
    assert_eq!(stored["ip"], "10.1.1.1");
}

#[tokio::test]
async fn revalidation_is_limited_to_the_course_teacher() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;
    let uri = format!("/api/attendance/{}/validate", ctx.record.id);

    let req = put(&uri, &ctx.other_teacher, json!({}));
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["data"]["errorCode"], "NOT_AUTHORIZED_TO_VALIDATE");

    let response = app.oneshot(put(&uri, &ctx.student, json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_record_is_not_found() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let response = app
        .oneshot(put("/api/attendance/9999/validate", &ctx.admin, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["data"]["errorCode"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_validation_method_is_invalid_input() {
    let (app, app_state) = make_test_app().await;
    let ctx = setup(app_state.db()).await;

    let uri = format!("/api/attendance/{}/validate", ctx.record.id);
    let body = json!({ "validationMethod": "CARRIER_PIGEON" });
    let response = app.oneshot(put(&uri, &ctx.teacher, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["data"]["errorCode"], "INVALID_INPUT");
}
