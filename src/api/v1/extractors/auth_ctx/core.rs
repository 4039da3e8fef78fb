use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::services::authz::Principal;

use super::AuthCtx;

/// Handler で AuthCtx を受け取るための extractor
/// middleware が Principal を request.extensions() に insert 済みならそれを使う
/// 無ければ anonymous（拒否するかどうかは `Authorized<O>` 側で決める）
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts.extensions.get::<Principal>().cloned();
        Ok(AuthCtxExtractor(AuthCtx::new(principal)))
    }
}
