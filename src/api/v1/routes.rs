/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health と /users を登録し、bearer 検証 middleware は /users 側だけに掛ける
 * - token が無いリクエストも通す (401/403 の判断は各 handler の Authorized<Op>)
 */
use axum::{Router, routing::get};

use crate::middleware::auth::access;
use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    users::{create_user, delete_user, get_user, list_users, update_user},
};

pub fn routes(state: AppState) -> Router<AppState> {
    let users = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        );

    Router::new()
        .route("/health", get(health))
        .merge(access::apply(users, state))
}
