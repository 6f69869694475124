use chrono::{DateTime, Utc};
use db::device_info::{DeviceInfo, GeoPoint};
use db::models::attendance_record::{
    AttendanceStatus, Model as AttendanceRecord, NewAttendanceRecord, ValidationMethod,
};
use db::models::{class, course, school, user};
use db::models::user::Role;
use sea_orm::DatabaseConnection;

/// Roughly the centre of Pretoria.
pub const SCHOOL_LOCATION: GeoPoint = GeoPoint {
    latitude: -25.7479,
    longitude: 28.2293,
};

pub struct Fixture {
    pub school: school::Model,
    pub class: class::Model,
    pub admin: user::Model,
    pub teacher: user::Model,
    pub student: user::Model,
    pub course: course::Model,
}

impl Fixture {
    pub async fn build(db: &DatabaseConnection) -> Self {
        let school = school::Model::create(db, "Hillcrest High", Some(SCHOOL_LOCATION), Some(150.0))
            .await
            .unwrap();
        let class = class::Model::create(db, school.id, "10A").await.unwrap();
        let admin = user::Model::create(db, "Admin", "admin@school.test", Role::Admin, None)
            .await
            .unwrap();
        let teacher = user::Model::create(db, "Teacher", "teacher@school.test", Role::Teacher, None)
            .await
            .unwrap();
        let student = user::Model::create(
            db,
            "Student",
            "student@school.test",
            Role::Student,
            Some(class.id),
        )
        .await
        .unwrap();
        let course = course::Model::create(db, class.id, Some(teacher.id), "Mathematics")
            .await
            .unwrap();

        Self {
            school,
            class,
            admin,
            teacher,
            student,
            course,
        }
    }

    /// Another student enrolled in the fixture's class.
    pub async fn classmate(&self, db: &DatabaseConnection, name: &str) -> user::Model {
        user::Model::create(
            db,
            name,
            &format!("{name}@school.test"),
            Role::Student,
            Some(self.class.id),
        )
        .await
        .unwrap()
    }

    pub async fn user(&self, db: &DatabaseConnection, name: &str, role: Role) -> user::Model {
        user::Model::create(db, name, &format!("{name}@school.test"), role, None)
            .await
            .unwrap()
    }
}

pub fn device(model: &str, ip: &str) -> DeviceInfo {
    DeviceInfo {
        user_agent: format!("Mozilla/5.0 ({model})"),
        platform: model.to_owned(),
        browser: "Chrome".into(),
        version: "128.0".into(),
        os: "Android".into(),
        ip: ip.to_owned(),
        location: None,
    }
}

pub async fn insert_record(
    db: &DatabaseConnection,
    student_id: i64,
    course_id: i64,
    marked_at: DateTime<Utc>,
    device_info: Option<DeviceInfo>,
) -> AttendanceRecord {
    AttendanceRecord::create(
        db,
        NewAttendanceRecord {
            student_id,
            course_id,
            marked_at,
            status: AttendanceStatus::Present,
            validation_method: ValidationMethod::Qr,
            validated_by_id: Some(student_id),
            device_info,
        },
    )
    .await
    .unwrap()
}
