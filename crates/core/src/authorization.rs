//! Ownership and role checks for mutating operations.

use crate::error::CoreError;
use crate::roles::ROLE_ADMIN;
use crate::types::DbId;

/// The authenticated caller of a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub role: String,
}

impl Actor {
    pub fn new(id: DbId, role: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        is_admin(&self.role)
    }
}

pub fn is_admin(role: &str) -> bool {
    role == ROLE_ADMIN
}

/// Admins may mutate anything; everyone else only what they own.
pub fn can_mutate(role: &str, actor_id: DbId, owner_id: DbId) -> bool {
    is_admin(role) || actor_id == owner_id
}

/// [`can_mutate`] as a `Result`. A missing role (unknown user) always fails.
pub fn ensure_can_mutate(
    role: Option<&str>,
    actor_id: DbId,
    owner_id: DbId,
    denied_message: &str,
) -> Result<(), CoreError> {
    match role {
        Some(role) if can_mutate(role, actor_id, owner_id) => Ok(()),
        _ => Err(CoreError::forbidden(denied_message)),
    }
}

/// Fail with [`CoreError::Forbidden`] unless `role` is admin.
pub fn ensure_admin(role: Option<&str>, denied_message: &str) -> Result<(), CoreError> {
    match role {
        Some(role) if is_admin(role) => Ok(()),
        _ => Err(CoreError::forbidden(denied_message)),
    }
}
