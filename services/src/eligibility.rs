use chrono::{DateTime, Utc};
use db::models::attendance_record::Model as AttendanceRecord;
use db::models::course::{self, Model as Course};
use db::models::user::{Model as User, Role};
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::error::AttendanceError;
use crate::principal::Principal;

/// Student and course that passed the eligibility checks.
#[derive(Debug, Clone)]
pub struct Eligible {
    pub student: User,
    pub course: Course,
}

pub struct EligibilityService;

impl EligibilityService {
    /// Checks, in order and stopping at the first failure, that the student exists and
    /// sits in a class, that the course belongs to that class, and that nothing has been
    /// recorded for the pair on `now`'s UTC day.
    pub async fn can_mark(
        db: &DatabaseConnection,
        student_id: i64,
        course_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Eligible, AttendanceError> {
        let student = User::find_student(db, student_id)
            .await?
            .filter(|s| s.class_id.is_some())
            .ok_or_else(|| AttendanceError::Ineligible("student not found or unassigned".into()))?;

        let course = course::Entity::find_by_id(course_id)
            .one(db)
            .await?
            .filter(|c| Some(c.class_id) == student.class_id)
            .ok_or_else(|| {
                AttendanceError::Ineligible(
                    "course not found or student not in course's class".into(),
                )
            })?;

        if AttendanceRecord::find_for_day(db, student_id, course_id, now.date_naive())
            .await?
            .is_some()
        {
            return Err(AttendanceError::AlreadyMarked);
        }

        Ok(Eligible { student, course })
    }

    /// Admins manage every course; teachers only the ones they teach.
    pub fn may_manage(principal: &Principal, course: &Course) -> bool {
        principal.is_admin()
            || (principal.role == Role::Teacher && course.is_taught_by(principal.id))
    }

    /// Loads the course and checks [`EligibilityService::may_manage`].
    pub async fn can_manage_course(
        db: &DatabaseConnection,
        principal: &Principal,
        course_id: i64,
    ) -> Result<Course, AttendanceError> {
        let course = course::Entity::find_by_id(course_id)
            .one(db)
            .await?
            .ok_or_else(|| AttendanceError::NotFound(format!("course {course_id} not found")))?;

        if !Self::may_manage(principal, &course) {
            return Err(AttendanceError::NotAuthorizedToValidate(
                "only an admin or the course's teacher may do this".into(),
            ));
        }
        Ok(course)
    }
}
