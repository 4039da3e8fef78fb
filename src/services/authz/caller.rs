//! Token claims → caller context.

use super::roles::{RoleSet, normalize_roles};

/// Subject reported for requests without an authenticated principal.
pub const ANONYMOUS: &str = "anonymous";

/// An authenticated principal, as produced by bearer token verification.
///
/// Signature, issuer, audience and expiry have already been checked when one of
/// these exists; `authorities` are the raw role names read from the configured
/// roles claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub email: Option<String>,
    pub authorities: Vec<String>,
    pub jti: Option<String>,
}

/// Who is calling, derived fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    subject: String,
    email: Option<String>,
    roles: RoleSet,
    authenticated: bool,
}

impl CallerContext {
    pub fn anonymous() -> Self {
        Self {
            subject: ANONYMOUS.to_string(),
            email: None,
            roles: RoleSet::new(),
            authenticated: false,
        }
    }

    pub fn authenticated(subject: impl Into<String>, email: Option<String>, roles: RoleSet) -> Self {
        Self {
            subject: subject.into(),
            email,
            roles,
            authenticated: true,
        }
    }

    /// Build the context for the current request. `None` means no principal was
    /// attached, which yields the anonymous context rather than an error.
    pub fn from_principal(principal: Option<&Principal>) -> Self {
        match principal {
            Some(p) => Self::authenticated(
                p.subject.clone(),
                p.email.clone(),
                normalize_roles(&p.authorities),
            ),
            None => Self::anonymous(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
