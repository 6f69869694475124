use db::models::user::Role;

/// The authenticated caller of a core operation.
///
/// Always passed explicitly; nothing in the core reads it from ambient request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
}

impl Principal {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when the caller is the student `student_id` acting for themselves.
    pub fn is_student(&self, student_id: i64) -> bool {
        self.role == Role::Student && self.id == student_id
    }
}
