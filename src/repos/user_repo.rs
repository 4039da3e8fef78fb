/*
 * Responsibility
 * - UserRepo: the persistence seam handlers talk to (after authorization)
 * - PgUserRepo: users テーブル向け SQLx 実装
 * - DB エラーは RepoError に変換して返す
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::services::authz::{RoleSet, roles::normalize_roles};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub tax_code: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: RoleSet,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub tax_code: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: RoleSet,
}

/// Full replacement of the mutable fields. Email is immutable.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: String,
    pub tax_code: String,
    pub first_name: String,
    pub last_name: String,
    // None → keep current roles
    pub roles: Option<RoleSet>,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Newest first.
    async fn list(&self) -> Result<Vec<UserRecord>, RepoError>;
    async fn get(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;
    async fn create(&self, user: NewUser) -> Result<UserRecord, RepoError>;
    async fn update(&self, id: Uuid, changes: UserChanges)
    -> Result<Option<UserRecord>, RepoError>;
    /// `false` when no such user existed.
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    tax_code: String,
    first_name: String,
    last_name: String,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            tax_code: row.tax_code,
            first_name: row.first_name,
            last_name: row.last_name,
            roles: normalize_roles(&row.roles),
            created_at: row.created_at,
        }
    }
}

fn role_names(roles: &RoleSet) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

/// Expected schema:
///
/// ```sql
/// CREATE TABLE users (
///     id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username    TEXT NOT NULL CONSTRAINT users_username_key UNIQUE,
///     email       TEXT NOT NULL CONSTRAINT users_email_key UNIQUE,
///     tax_code    TEXT NOT NULL,
///     first_name  TEXT NOT NULL,
///     last_name   TEXT NOT NULL,
///     roles       TEXT[] NOT NULL DEFAULT '{}',
///     created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
/// );
/// ```
#[derive(Clone, Debug)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn list(&self) -> Result<Vec<UserRecord>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, tax_code, first_name, last_name, roles, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, tax_code, first_name, last_name, roles, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, tax_code, first_name, last_name, roles)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, tax_code, first_name, last_name, roles, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.tax_code)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(role_names(&user.roles))
        .fetch_one(&self.db)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row.into())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, RepoError> {
        // roles: NULL → keep the stored value
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                username = $2,
                tax_code = $3,
                first_name = $4,
                last_name = $5,
                roles = COALESCE($6, roles)
            WHERE id = $1
            RETURNING id, username, email, tax_code, first_name, last_name, roles, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.username)
        .bind(&changes.tax_code)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(changes.roles.as_ref().map(role_names))
        .fetch_optional(&self.db)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row.map(UserRecord::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
