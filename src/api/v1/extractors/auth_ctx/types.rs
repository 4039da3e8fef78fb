/*
 * Responsibility
 * - Handler から見える「現在の呼び出し元」の型 (read-only accessor)
 * - middleware が検証して request extensions に格納した Principal から、リクエストごとに組み立てる
 *
 * Notes
 * - Token 検証は middleware/services 側の責務
 * - 認可判定 (authorize) と表示制御 (redact) には caller() をそのまま渡す
 */

use crate::services::authz::{ANONYMOUS, CallerContext, Principal, Role, RoleSet};

/// Per-request authentication context.
///
/// Built from whatever principal the bearer middleware attached (possibly none),
/// never cached across requests.
#[derive(Debug, Clone)]
pub struct AuthCtx {
    principal: Option<Principal>,
    caller: CallerContext,
}

impl AuthCtx {
    pub fn new(principal: Option<Principal>) -> Self {
        let caller = CallerContext::from_principal(principal.as_ref());
        Self { principal, caller }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn current_principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// The subject of the current principal, or `"anonymous"`.
    pub fn current_username(&self) -> &str {
        self.principal
            .as_ref()
            .map(|p| p.subject.as_str())
            .unwrap_or(ANONYMOUS)
    }

    pub fn current_roles(&self) -> &RoleSet {
        self.caller.roles()
    }

    /// `has_role("ADMIN")`, `has_role("ROLE_ADMIN")` and `has_role("admin")` are
    /// equivalent. Unknown names are never held.
    pub fn has_role(&self, name: &str) -> bool {
        Role::from_claim(name).is_some_and(|role| self.caller.roles().contains(&role))
    }

    pub fn caller(&self) -> &CallerContext {
        &self.caller
    }
}
