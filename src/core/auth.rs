//! Signed-in user context.
//!
//! Operations receive the viewer as `Option<&AuthUser>`; `None` means nobody is
//! signed in.

use crate::{
    entities::user,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};

pub use crate::entities::user::UserRole;

/// The authenticated user as exposed by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// User id
    pub id: String,
    /// Role deciding visibility
    pub role: UserRole,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Optional phone number
    pub phone: Option<String>,
}

impl AuthUser {
    /// Returns the signed-in user or [`Error::AuthenticationRequired`].
    pub fn require(viewer: Option<&Self>) -> Result<&Self> {
        viewer.ok_or(Error::AuthenticationRequired)
    }
}

impl From<user::Model> for AuthUser {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            role: model.role,
            name: model.name,
            email: model.email,
            phone: model.phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_without_user() {
        assert!(matches!(
            AuthUser::require(None),
            Err(Error::AuthenticationRequired)
        ));
    }

    #[test]
    fn test_mentor_roles() {
        assert!(UserRole::Consultant.is_mentor());
        assert!(UserRole::Teacher.is_mentor());
        assert!(!UserRole::Student.is_mentor());
        assert!(!UserRole::Admin.is_mentor());
    }
}
