//! Endpoint policy: every operation requires exactly one permission.
//!
//! `authorize` is a pure decision over an explicit caller context; the HTTP
//! adapter (`Authorized<O>` extractor) calls it before the handler body runs.

use std::fmt;

use thiserror::Error;

use super::caller::CallerContext;
use super::permissions::{Permission, permissions_for};

/// Operations exposed by the user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListUsers,
    GetUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::ListUsers,
        Operation::GetUser,
        Operation::CreateUser,
        Operation::UpdateUser,
        Operation::DeleteUser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListUsers => "list_users",
            Operation::GetUser => "get_user",
            Operation::CreateUser => "create_user",
            Operation::UpdateUser => "update_user",
            Operation::DeleteUser => "delete_user",
        }
    }

    /// The single permission this operation requires. Fixed at build time.
    pub fn required_permission(&self) -> Permission {
        match self {
            Operation::ListUsers | Operation::GetUser => Permission::ReadUser,
            Operation::CreateUser => Permission::CreateUser,
            Operation::UpdateUser => Permission::UpdateUser,
            Operation::DeleteUser => Permission::DeleteUser,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation → permission table, for startup logging and audits.
pub fn policy_table() -> impl Iterator<Item = (Operation, Permission)> {
    Operation::ALL
        .into_iter()
        .map(|op| (op, op.required_permission()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// No authenticated principal on the request (401).
    #[error("authentication required")]
    Unauthenticated,
    /// Authenticated, but the required permission was not granted (403).
    /// Only the unmet requirement is reported.
    #[error("missing required permission '{0}'")]
    Forbidden(Permission),
}

/// Decide whether `caller` may perform an action requiring `required`.
///
/// - No IO
/// - Deterministic for a given (permission, caller)
pub fn authorize(required: Permission, caller: &CallerContext) -> Result<(), AuthzError> {
    if !caller.is_authenticated() {
        return Err(AuthzError::Unauthenticated);
    }

    if permissions_for(caller.roles()).contains(&required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

/// `authorize` against the permission declared for `operation`.
pub fn authorize_operation(operation: Operation, caller: &CallerContext) -> Result<(), AuthzError> {
    authorize(operation.required_permission(), caller)
}
