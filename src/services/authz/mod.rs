//! Authorization and disclosure core.
//!
//! Pure functions over explicit values; nothing in here knows about axum or the
//! database.
//!
//! - `caller`: verified principal → `CallerContext`
//! - `permissions`: role → permission table
//! - `policy`: operation → required permission, `authorize`
//! - `disclosure`: role-tiered response redaction

pub mod caller;
pub mod disclosure;
pub mod permissions;
pub mod policy;
pub mod roles;

pub use caller::{ANONYMOUS, CallerContext, Principal};
pub use disclosure::{Disclose, DisclosureTier, redact, redact_all};
pub use permissions::{Permission, PermissionSet, permissions_for};
pub use policy::{AuthzError, Operation, authorize, authorize_operation};
pub use roles::{Role, RoleSet};
