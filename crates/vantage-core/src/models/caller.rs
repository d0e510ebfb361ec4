use uuid::Uuid;

use super::{User, UserRole};

/// The authenticated principal behind a request, resolved from a bearer JWT
/// or a viewing capability token.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub company_id: Uuid,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            company_id: user.company_id,
        }
    }
}
