/*!
 * Endpoint policy guard as an extractor
 *
 * Responsibility:
 * - handler のシグネチャで必要な operation を宣言する: `Authorized<DeleteUser>`
 * - body の extractor (Json) より先に走るので、認可前に body が読まれることはない
 * - 失敗時: anonymous → 401, 権限不足 → 403 (handler 本体は呼ばれない)
 */

use std::marker::PhantomData;
use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::authz::{AuthzError, Operation, authorize_operation};

use super::auth_ctx::{AuthCtx, AuthCtxExtractor};

/// Binds a marker type to the operation it guards.
pub trait OperationPolicy {
    const OPERATION: Operation;
}

macro_rules! operations {
    ($($name:ident),* $(,)?) => {
        $(
            pub struct $name;

            impl OperationPolicy for $name {
                const OPERATION: Operation = Operation::$name;
            }
        )*
    };
}

operations!(ListUsers, GetUser, CreateUser, UpdateUser, DeleteUser);

/// An `AuthCtx` that has passed the policy check for `O`.
pub struct Authorized<O> {
    ctx: AuthCtx,
    _operation: PhantomData<fn() -> O>,
}

impl<O> Deref for Authorized<O> {
    type Target = AuthCtx;

    fn deref(&self) -> &AuthCtx {
        &self.ctx
    }
}

impl<O, S> FromRequestParts<S> for Authorized<O>
where
    O: OperationPolicy,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthCtxExtractor(ctx) = match AuthCtxExtractor::from_request_parts(parts, state).await {
            Ok(extracted) => extracted,
            Err(never) => match never {},
        };

        let operation = O::OPERATION;
        match authorize_operation(operation, ctx.caller()) {
            Ok(()) => Ok(Self {
                ctx,
                _operation: PhantomData,
            }),
            Err(err @ AuthzError::Unauthenticated) => {
                tracing::debug!(%operation, "rejected unauthenticated request");
                Err(err.into())
            }
            Err(err @ AuthzError::Forbidden(permission)) => {
                tracing::warn!(
                    %operation,
                    %permission,
                    subject = %ctx.current_username(),
                    "permission denied"
                );
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    use crate::services::authz::Principal;

    fn parts(roles: Option<&[&str]>) -> Parts {
        let (mut parts, ()) = Request::builder()
            .uri("/api/v1/users")
            .body(())
            .unwrap()
            .into_parts();
        if let Some(roles) = roles {
            parts.extensions.insert(Principal {
                subject: "sub-1".to_string(),
                email: None,
                authorities: roles.iter().map(|s| s.to_string()).collect(),
                jti: None,
            });
        }
        parts
    }

    async fn status_for<O: OperationPolicy>(roles: Option<&[&str]>) -> Result<(), StatusCode> {
        let mut parts = parts(roles);
        Authorized::<O>::from_request_parts(&mut parts, &())
            .await
            .map(|_| ())
            .map_err(|e| e.into_response().status())
    }

    #[tokio::test]
    async fn anonymous_gets_401() {
        assert_eq!(status_for::<DeleteUser>(None).await, Err(StatusCode::UNAUTHORIZED));
        assert_eq!(status_for::<ListUsers>(None).await, Err(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn insufficient_role_gets_403() {
        assert_eq!(
            status_for::<DeleteUser>(Some(&["DEVELOPER"])).await,
            Err(StatusCode::FORBIDDEN)
        );
        assert_eq!(
            status_for::<CreateUser>(Some(&["unknown"])).await,
            Err(StatusCode::FORBIDDEN)
        );
    }

    #[tokio::test]
    async fn sufficient_role_passes() {
        assert_eq!(status_for::<GetUser>(Some(&["DEVELOPER"])).await, Ok(()));
        assert_eq!(status_for::<UpdateUser>(Some(&["ROLE_OPERATOR"])).await, Ok(()));
        assert_eq!(status_for::<DeleteUser>(Some(&["ADMIN"])).await, Ok(()));
    }
}
