use std::sync::Arc;

use sea_orm::DatabaseConnection;
use services::attendance_validation::AttendanceValidationService;

/// Shared handles every handler needs: the store and the attendance core.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    attendance: Arc<AttendanceValidationService>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, attendance: AttendanceValidationService) -> Self {
        Self {
            db,
            attendance: Arc::new(attendance),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn attendance(&self) -> &AttendanceValidationService {
        &self.attendance
    }
}
