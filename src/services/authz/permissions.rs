//! Role → permission resolution.
//!
//! Permissions are never read from the token; they are derived from the roles it
//! carries through the static table below.

use std::collections::BTreeSet;
use std::fmt;

use super::roles::{Role, RoleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    ReadUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

pub type PermissionSet = BTreeSet<Permission>;

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadUser => "read_user",
            Permission::CreateUser => "create_user",
            Permission::UpdateUser => "update_user",
            Permission::DeleteUser => "delete_user",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed role → permission table. Every role maps to a non-empty set.
pub static ROLE_PERMISSIONS: &[(Role, &[Permission])] = &[
    (
        Role::Admin,
        &[
            Permission::ReadUser,
            Permission::CreateUser,
            Permission::UpdateUser,
            Permission::DeleteUser,
        ],
    ),
    (
        Role::Operator,
        &[
            Permission::ReadUser,
            Permission::CreateUser,
            Permission::UpdateUser,
        ],
    ),
    (Role::Developer, &[Permission::ReadUser]),
];

/// Permissions granted to a single role.
pub fn granted_to(role: Role) -> &'static [Permission] {
    ROLE_PERMISSIONS
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, perms)| *perms)
        .unwrap_or(&[])
}

/// Union of the permissions of every role in `roles`.
pub fn permissions_for(roles: &RoleSet) -> PermissionSet {
    roles
        .iter()
        .flat_map(|role| granted_to(*role).iter().copied())
        .collect()
}
