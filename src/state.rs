/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - users: UserRepo (Postgres or in-memory), auth: AuthService
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - Per-request caller data never lives here; it travels in request extensions
 */
use std::sync::Arc;

use crate::repos::UserRepo;
use crate::services::auth::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserRepo>, auth: Arc<AuthService>) -> Self {
        Self { users, auth }
    }
}
