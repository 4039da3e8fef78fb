/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - RepoError / AuthzError / validation error を統一的に変換
 */
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::{RepoError, UniqueField};
use crate::services::authz::{AuthzError, Permission};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden: missing {permission}")]
    Forbidden { permission: Permission },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("{code}: {message}")]
    Conflict { code: &'static str, message: String },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "authentication required".into(),
            ),
            // Only the unmet requirement; never which roles would satisfy it.
            AppError::Forbidden { permission } => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                format!("missing required permission '{permission}'"),
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found."),
            ),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        if status == StatusCode::UNAUTHORIZED {
            return (
                status,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(body),
            )
                .into_response();
        }

        (status, Json(body)).into_response()
    }
}

impl From<AuthzError> for AppError {
    fn from(e: AuthzError) -> Self {
        match e {
            AuthzError::Unauthenticated => AppError::Unauthorized,
            AuthzError::Forbidden(permission) => AppError::Forbidden { permission },
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict(UniqueField::Email) => {
                AppError::conflict("EMAIL_TAKEN", "email already in use")
            }
            RepoError::Conflict(UniqueField::Username) => {
                AppError::conflict("USERNAME_TAKEN", "username already in use")
            }
            RepoError::Db(err) => {
                tracing::error!(error = ?err, "user repository failure");
                AppError::Internal
            }
        }
    }
}
