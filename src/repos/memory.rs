//! In-memory `UserRepo`, used when no `DATABASE_URL` is configured and in tests.
//!
//! Enforces the same uniqueness rules as the Postgres schema (email, username).

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::{RepoError, UniqueField};
use crate::repos::user_repo::{NewUser, UserChanges, UserRecord, UserRepo};

#[derive(Debug, Default)]
pub struct InMemoryUserRepo {
    // Insertion order; list() reverses it for newest-first.
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn list(&self) -> Result<Vec<UserRecord>, RepoError> {
        let users = self.users.read().await;
        Ok(users.iter().rev().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, RepoError> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict(UniqueField::Email));
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(RepoError::Conflict(UniqueField::Username));
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            tax_code: user.tax_code,
            first_name: user.first_name,
            last_name: user.last_name,
            roles: user.roles,
            created_at: Utc::now(),
        };
        users.push(record.clone());

        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, RepoError> {
        let mut users = self.users.write().await;

        // missing user wins over a username clash, as with `UPDATE ... WHERE id`
        let Some(idx) = users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };

        if users
            .iter()
            .any(|u| u.id != id && u.username == changes.username)
        {
            return Err(RepoError::Conflict(UniqueField::Username));
        }

        let user = &mut users[idx];
        user.username = changes.username;
        user.tax_code = changes.tax_code;
        user.first_name = changes.first_name;
        user.last_name = changes.last_name;
        if let Some(roles) = changes.roles {
            user.roles = roles;
        }

        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::authz::{Role, RoleSet};

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            tax_code: "TSTUSER90A01H501Z".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            roles: RoleSet::from([Role::Developer]),
        }
    }

    #[tokio::test]
    async fn create_get_list_delete() {
        let repo = InMemoryUserRepo::new();
        let a = repo.create(new_user("a", "a@example.com")).await.unwrap();
        let b = repo.create(new_user("b", "b@example.com")).await.unwrap();

        assert_eq!(repo.get(a.id).await.unwrap(), Some(a.clone()));

        let listed: Vec<_> = repo.list().await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(listed, vec![b.id, a.id]);

        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert_eq!(repo.get(a.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_email_and_username_conflict() {
        let repo = InMemoryUserRepo::new();
        repo.create(new_user("a", "a@example.com")).await.unwrap();

        let err = repo.create(new_user("other", "a@example.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(UniqueField::Email)));

        let err = repo.create(new_user("a", "other@example.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(UniqueField::Username)));
    }

    #[tokio::test]
    async fn update_keeps_roles_when_absent_and_email_always() {
        let repo = InMemoryUserRepo::new();
        let user = repo.create(new_user("a", "a@example.com")).await.unwrap();

        let updated = repo
            .update(
                user.id,
                UserChanges {
                    username: "a2".to_string(),
                    tax_code: "NEWCODE".to_string(),
                    first_name: "New".to_string(),
                    last_name: "Name".to_string(),
                    roles: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.username, "a2");
        assert_eq!(updated.email, "a@example.com");
        assert_eq!(updated.roles, RoleSet::from([Role::Developer]));

        let missing = repo
            .update(
                Uuid::new_v4(),
                UserChanges {
                    username: "x".to_string(),
                    tax_code: "x".to_string(),
                    first_name: "x".to_string(),
                    last_name: "x".to_string(),
                    roles: Some(RoleSet::from([Role::Admin])),
                },
            )
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    fn changes(username: &str, roles: Option<RoleSet>) -> UserChanges {
        UserChanges {
            username: username.to_string(),
            tax_code: "NEWCODE".to_string(),
            first_name: "New".to_string(),
            last_name: "Name".to_string(),
            roles,
        }
    }

    #[tokio::test]
    async fn update_of_missing_user_is_none_even_with_taken_username() {
        let repo = InMemoryUserRepo::new();
        repo.create(new_user("taken", "taken@example.com")).await.unwrap();

        let res = repo
            .update(Uuid::new_v4(), changes("taken", None))
            .await
            .unwrap();
        assert_eq!(res, None);
    }

    #[tokio::test]
    async fn update_to_another_users_name_conflicts() {
        let repo = InMemoryUserRepo::new();
        repo.create(new_user("taken", "taken@example.com")).await.unwrap();
        let user = repo.create(new_user("b", "b@example.com")).await.unwrap();

        let err = repo
            .update(user.id, changes("taken", None))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(UniqueField::Username)));

        // keeping its own name is fine
        assert!(repo.update(user.id, changes("b", None)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_replaces_roles_when_given() {
        let repo = InMemoryUserRepo::new();
        let user = repo.create(new_user("a", "a@example.com")).await.unwrap();

        let updated = repo
            .update(user.id, changes("a", Some(RoleSet::from([Role::Admin]))))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.roles, RoleSet::from([Role::Admin]));
        assert_eq!(repo.get(user.id).await.unwrap().unwrap().roles, updated.roles);
    }
}
