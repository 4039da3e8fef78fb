/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

/// Columns with a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("conflict on {0:?}")]
    Conflict(UniqueField),
}

impl RepoError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some("23505")
        {
            let field = match dbe.constraint() {
                Some(c) if c.contains("email") => UniqueField::Email,
                _ => UniqueField::Username,
            };
            return RepoError::Conflict(field);
        }
        RepoError::Db(e)
    }
}
