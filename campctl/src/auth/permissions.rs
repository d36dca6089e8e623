//! Authorization checks applied by API handlers.

use crate::{
    api::models::users::CurrentUser,
    errors::{Error, Result},
    types::{Operation, Permission, Resource, UserId},
};

/// Require that the current user is an admin.
pub fn require_admin(user: &CurrentUser, action: Operation, resource: Resource) -> Result<()> {
    if user.is_admin {
        return Ok(());
    }
    Err(Error::InsufficientPermissions {
        required: Permission::Allow(resource, action),
        action,
        resource: resource.to_string(),
    })
}

/// Require that the current user is an admin or owns the target resource.
pub fn require_admin_or_self(
    user: &CurrentUser,
    owner_id: UserId,
    action: Operation,
    resource: Resource,
) -> Result<()> {
    if user.is_admin || user.id == owner_id {
        return Ok(());
    }
    Err(Error::InsufficientPermissions {
        required: Permission::Any(vec![Permission::Allow(resource, action), Permission::Owner]),
        action,
        resource: resource.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(is_admin: bool) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "u".to_string(),
            email: "u@example.com".to_string(),
            display_name: None,
            is_admin,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&user(true), Operation::Delete, Resource::Users).is_ok());

        let err = require_admin(&user(false), Operation::Delete, Resource::Users).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_require_admin_or_self() {
        let me = user(false);
        assert!(require_admin_or_self(&me, me.id, Operation::Read, Resource::ApiKeys).is_ok());
        assert!(require_admin_or_self(&user(true), me.id, Operation::Read, Resource::ApiKeys).is_ok());

        let err = require_admin_or_self(&me, Uuid::new_v4(), Operation::Read, Resource::ApiKeys).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
