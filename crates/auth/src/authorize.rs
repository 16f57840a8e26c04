use thiserror::Error;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' lacks permission '{permission}'")]
    Forbidden { role: Role, permission: Permission },
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ManageUsers,
    Permission::ManageEvents,
    Permission::ManageInventory,
    Permission::ManageAttendees,
    Permission::ViewReports,
    Permission::ViewEvents,
    Permission::SelfRegister,
    Permission::ManageOwnProfile,
];

const REGULAR_USER_PERMISSIONS: &[Permission] = &[
    Permission::ViewEvents,
    Permission::SelfRegister,
    Permission::ManageOwnProfile,
];

/// Role-keyed policy table.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::RegularUser => REGULAR_USER_PERMISSIONS,
    }
}

/// Authorize a principal for a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: Permission) -> Result<(), AuthzError> {
    if permissions_for(principal.role).contains(&required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            permission: required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventdesk_core::UserId;

    fn principal(role: Role) -> Principal {
        Principal::new(UserId::new(1), "someone", role)
    }

    #[test]
    fn admin_is_granted_everything() {
        let admin = principal(Role::Admin);
        for perm in ADMIN_PERMISSIONS {
            assert!(authorize(&admin, *perm).is_ok());
        }
    }

    #[test]
    fn regular_user_cannot_manage_inventory() {
        let user = principal(Role::RegularUser);
        assert!(authorize(&user, Permission::SelfRegister).is_ok());

        let err = authorize(&user, Permission::ManageInventory).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden {
                role: Role::RegularUser,
                permission: Permission::ManageInventory,
            }
        );
        assert_eq!(
            err.to_string(),
            "forbidden: role 'user' lacks permission 'inventory.manage'"
        );
    }
}
