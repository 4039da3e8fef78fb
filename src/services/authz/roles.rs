//! Roles carried by identity tokens.
//!
//! Roles are assigned by the identity provider; this service never creates them.
//! The declaration order of `Role` is the privilege order (most privileged first),
//! so a `BTreeSet<Role>` iterates from the strongest role downwards.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Authority prefix some identity providers put in front of role names.
const ROLE_PREFIX: &str = "ROLE_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Operator,
    /// The plain "user" tier. `USER` is accepted as an alias.
    #[serde(alias = "USER")]
    Developer,
}

pub type RoleSet = BTreeSet<Role>;

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Operator, Role::Developer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Operator => "OPERATOR",
            Role::Developer => "DEVELOPER",
        }
    }

    /// Normalize a raw role name from a token claim.
    ///
    /// Trims whitespace, strips an optional `ROLE_` prefix and matches
    /// case-insensitively. Returns `None` for names this service does not know.
    pub fn from_claim(raw: &str) -> Option<Self> {
        let name = raw.trim();
        let name = match name.get(..ROLE_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(ROLE_PREFIX) => &name[ROLE_PREFIX.len()..],
            _ => name,
        };

        match name.to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "OPERATOR" => Some(Role::Operator),
            "DEVELOPER" | "USER" => Some(Role::Developer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a list of raw role names into a role set.
///
/// Unknown names are dropped: a token may legitimately carry roles that mean
/// nothing to this service.
pub fn normalize_roles<I, S>(names: I) -> RoleSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let role = Role::from_claim(name);
            if role.is_none() {
                tracing::debug!(role = %name, "ignoring unknown role claim");
            }
            role
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_names_are_normalized() {
        assert_eq!(Role::from_claim("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_claim("ROLE_OPERATOR"), Some(Role::Operator));
        assert_eq!(Role::from_claim("role_admin"), Some(Role::Admin));
        assert_eq!(Role::from_claim("  developer "), Some(Role::Developer));
        assert_eq!(Role::from_claim("USER"), Some(Role::Developer));
        assert_eq!(Role::from_claim("ROLE_"), None);
        assert_eq!(Role::from_claim("billing"), None);
        assert_eq!(Role::from_claim(""), None);
    }

    #[test]
    fn unknown_roles_are_dropped() {
        let roles = normalize_roles(["ROLE_ADMIN", "offline_access", "uma_authorization"]);
        assert_eq!(roles, RoleSet::from([Role::Admin]));
        assert!(normalize_roles(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn set_iterates_in_privilege_order() {
        let roles = RoleSet::from([Role::Developer, Role::Admin, Role::Operator]);
        let ordered: Vec<_> = roles.into_iter().collect();
        assert_eq!(ordered, vec![Role::Admin, Role::Operator, Role::Developer]);
    }

    #[test]
    fn serde_uses_upper_case_names() {
        let json = serde_json::to_string(&RoleSet::from([Role::Operator, Role::Developer])).unwrap();
        assert_eq!(json, r#"["OPERATOR","DEVELOPER"]"#);

        let parsed: RoleSet = serde_json::from_str(r#"["USER","ADMIN"]"#).unwrap();
        assert_eq!(parsed, RoleSet::from([Role::Admin, Role::Developer]));
    }
}
