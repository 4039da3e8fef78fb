/*
 * Responsibility
 * - Users の request/response DTO (JSON は camelCase)
 * - validation (形式チェック) 用の validate()
 * - UserResponse がどの tier でどのフィールドを見せるか (Disclose)
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::{NewUser, UserChanges, UserRecord};
use crate::services::authz::{Disclose, DisclosureTier, RoleSet};

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

// local@domain with no whitespace and a dot somewhere in the domain
fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub tax_code: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub roles: RoleSet,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if blank(&self.username) {
            return Err("username is required");
        }
        if blank(&self.email) {
            return Err("email is required");
        }
        if !looks_like_email(self.email.trim()) {
            return Err("email is invalid");
        }
        if blank(&self.tax_code) {
            return Err("taxCode is required");
        }
        if blank(&self.first_name) {
            return Err("firstName is required");
        }
        if blank(&self.last_name) {
            return Err("lastName is required");
        }
        if self.roles.is_empty() {
            return Err("at least one role is required");
        }

        Ok(())
    }

    pub fn into_new_user(self) -> NewUser {
        NewUser {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            tax_code: self.tax_code.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            roles: self.roles,
        }
    }
}

/// Email is immutable and therefore not part of the update body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: String,
    pub tax_code: String,
    pub first_name: String,
    pub last_name: String,
    // None or empty: keep current roles
    #[serde(default)]
    pub roles: Option<RoleSet>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if blank(&self.username) {
            return Err("username is required");
        }
        if blank(&self.tax_code) {
            return Err("taxCode is required");
        }
        if blank(&self.first_name) {
            return Err("firstName is required");
        }
        if blank(&self.last_name) {
            return Err("lastName is required");
        }
        Ok(())
    }

    pub fn into_changes(self) -> UserChanges {
        UserChanges {
            username: self.username.trim().to_string(),
            tax_code: self.tax_code.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            roles: self.roles.filter(|r| !r.is_empty()),
        }
    }
}

/// Fields hidden from a tier serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub tax_code: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub roles: Option<RoleSet>,
}

impl From<UserRecord> for UserResponse {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            tax_code: Some(u.tax_code),
            first_name: u.first_name,
            last_name: u.last_name,
            roles: Some(u.roles),
        }
    }
}

impl Disclose for UserResponse {
    fn disclose(self, tier: DisclosureTier) -> Self {
        match tier {
            DisclosureTier::Full => self,
            DisclosureTier::Operator => Self {
                tax_code: None,
                ..self
            },
            DisclosureTier::Restricted => Self {
                tax_code: None,
                roles: None,
                ..self
            },
        }
    }
}
