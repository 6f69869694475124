use db::models::user::Role;
use serde::{Deserialize, Serialize};
use services::principal::Principal;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
    pub role: Role,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal::new(self.sub, self.role)
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
