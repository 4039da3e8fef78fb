//! CORS policy for browser clients of the user directory.
//!
//! - Development: any origin.
//! - Production: exact-match allowlist from `CORS_ALLOWED_ORIGINS`; an empty list
//!   allows no cross-origin callers.
//!
//! Credentials are never allowed: callers authenticate with bearer tokens, not cookies.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

pub fn apply(router: Router, config: &Config) -> Router {
    let allow_origin = if config.app_env.is_production() {
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| match HeaderValue::from_str(s) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %s, "ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();

        AllowOrigin::list(allowed)
    } else {
        AllowOrigin::from(Any)
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([HeaderName::from_static("x-request-id")])
        .max_age(Duration::from_secs(60 * 10));

    router.layer(cors)
}
