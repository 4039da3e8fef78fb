//! Bearer access token (JWT) verification → `Principal` in request extensions.
//!
//! - No `Authorization` header: the request continues anonymously. Whether that
//!   is acceptable is decided per operation by the `Authorized<O>` extractor
//!   (protected operations answer 401).
//! - Header present but malformed, or the token fails verification: 401 here.
//! - Valid token: the verified `Principal` is inserted for the extractors.
//!
//! The principal lives only in this request's extensions and is dropped with it.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// `/api/v1/*` に bearer 検証を掛けるための middleware を適用する。
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

/// `Ok(None)` when no Authorization header is present at all.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
    let (scheme, token) = value.split_once(' ').ok_or(AppError::Unauthorized)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AppError::Unauthorized);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    Ok(Some(token))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(req.headers())? else {
        return Ok(next.run(req).await);
    };

    // 署名検証 + iss/aud/exp/leeway は AuthService 側で実施
    let principal = match state.auth.verify_principal(token) {
        Ok(principal) => principal,
        Err(err) => {
            tracing::warn!(error = %err, "access token verification failed");
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!(
        subject = %principal.subject,
        jti = ?principal.jti,
        "access token verified"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
