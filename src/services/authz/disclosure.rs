//! Role-based response redaction.
//!
//! The tier is chosen by presence of the most privileged role, not by counting
//! or intersecting roles: ADMIN > OPERATOR > everything else. Redaction is a
//! total function: any role set, including the empty one, maps to a tier.

use super::roles::{Role, RoleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DisclosureTier {
    /// Everything visible.
    Full,
    /// Sensitive personal identifiers hidden.
    Operator,
    /// Sensitive identifiers and authorization data hidden.
    Restricted,
}

impl DisclosureTier {
    pub fn for_roles(roles: &RoleSet) -> Self {
        if roles.contains(&Role::Admin) {
            DisclosureTier::Full
        } else if roles.contains(&Role::Operator) {
            DisclosureTier::Operator
        } else {
            DisclosureTier::Restricted
        }
    }
}

/// A response type that knows which of its fields each tier may see.
///
/// Implementations must only clear fields (never fill them in), so applying
/// the same tier twice is a no-op.
pub trait Disclose {
    fn disclose(self, tier: DisclosureTier) -> Self;
}

/// Project a single response for a caller holding `roles`.
pub fn redact<T: Disclose>(response: T, roles: &RoleSet) -> T {
    response.disclose(DisclosureTier::for_roles(roles))
}

/// Project every element of a list response, preserving order and length.
pub fn redact_all<T: Disclose>(responses: Vec<T>, roles: &RoleSet) -> Vec<T> {
    let tier = DisclosureTier::for_roles(roles);
    responses.into_iter().map(|r| r.disclose(tier)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Probe {
        id: u32,
        secret: Option<&'static str>,
        internal: Option<&'static str>,
    }

    impl Disclose for Probe {
        fn disclose(self, tier: DisclosureTier) -> Self {
            match tier {
                DisclosureTier::Full => self,
                DisclosureTier::Operator => Self { secret: None, ..self },
                DisclosureTier::Restricted => Self {
                    secret: None,
                    internal: None,
                    ..self
                },
            }
        }
    }

    fn probe(id: u32) -> Probe {
        Probe {
            id,
            secret: Some("s"),
            internal: Some("i"),
        }
    }

    #[test]
    fn tier_by_most_privileged_role() {
        use Role::*;

        assert_eq!(DisclosureTier::for_roles(&RoleSet::from([Admin])), DisclosureTier::Full);
        assert_eq!(
            DisclosureTier::for_roles(&RoleSet::from([Admin, Developer])),
            DisclosureTier::Full
        );
        assert_eq!(
            DisclosureTier::for_roles(&RoleSet::from([Admin, Operator, Developer])),
            DisclosureTier::Full
        );
        assert_eq!(
            DisclosureTier::for_roles(&RoleSet::from([Operator])),
            DisclosureTier::Operator
        );
        assert_eq!(
            DisclosureTier::for_roles(&RoleSet::from([Operator, Developer])),
            DisclosureTier::Operator
        );
        assert_eq!(
            DisclosureTier::for_roles(&RoleSet::from([Developer])),
            DisclosureTier::Restricted
        );
        assert_eq!(DisclosureTier::for_roles(&RoleSet::new()), DisclosureTier::Restricted);
    }

    #[test]
    fn list_redaction_is_element_wise() {
        let roles = RoleSet::from([Role::Operator]);
        let items: Vec<Probe> = (1..=4).map(probe).collect();

        let one_by_one: Vec<Probe> = items.iter().cloned().map(|p| redact(p, &roles)).collect();
        let listed = redact_all(items, &roles);

        assert_eq!(listed, one_by_one);
        assert_eq!(listed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_list_stays_empty() {
        assert!(redact_all(Vec::<Probe>::new(), &RoleSet::new()).is_empty());
    }
}
