/*
 * Responsibility
 * - GET /health (疎通用)
 * - 認可なし: token が無くても 200 を返す
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
