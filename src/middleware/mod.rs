/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: bearer 検証 (Router<AppState> に掛ける)
 * - http / cors / security_headers: transport 全体に掛ける layer
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
