//! Shared fixtures for the HTTP-level tests.
//!
//! Tokens are signed with a fixed Ed25519 key so every test run verifies the
//! same way the server would in production (EdDSA, iss/aud/exp checks).
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;

use user_directory::app::build_router;
use user_directory::config::{AppEnv, Config};
use user_directory::repos::{InMemoryUserRepo, NewUser, UserRecord, UserRepo};
use user_directory::services::auth::build_auth_service;
use user_directory::services::authz::RoleSet;
use user_directory::state::AppState;

pub const ISSUER: &str = "https://idp.test/realms/users";
pub const AUDIENCE: &str = "user-directory";

struct Keys {
    private_pem: String,
    public_pem: String,
}

fn keys() -> &'static Keys {
    static KEYS: OnceLock<Keys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        Keys {
            private_pem: signing.to_pkcs8_pem(LineEnding::LF).unwrap().to_string(),
            public_pem: signing
                .verifying_key()
                .to_public_key_pem(LineEnding::LF)
                .unwrap(),
        }
    })
}

pub fn test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: None,
        app_env: AppEnv::Development,
        cors_allowed_origins: Vec::new(),
        auth_issuer: ISSUER.to_string(),
        auth_audience: AUDIENCE.to_string(),
        access_token_leeway_seconds: 0,
        access_jwt_public_key_pem: keys().public_pem.clone(),
        auth_roles_claim: "roles".to_string(),
        http_body_limit_bytes: 64 * 1024,
        http_timeout_seconds: 5,
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUserRepo>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let users = Arc::new(InMemoryUserRepo::new());
        let auth = build_auth_service(&config).unwrap();

        let state = AppState::new(users.clone(), auth);
        Self {
            router: build_router(state, &config),
            users,
        }
    }

    pub async fn seed(&self, username: &str, email: &str, roles: RoleSet) -> UserRecord {
        self.users
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                tax_code: "TSTUSER90A01H501Z".to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                roles,
            })
            .await
            .unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        (status, read_json(res.into_body()).await)
    }
}

/// `Value::Null` for an empty body.
pub async fn read_json(body: Body) -> Value {
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

pub fn sign(claims: &Value) -> String {
    let key = EncodingKey::from_ed_pem(keys().private_pem.as_bytes()).unwrap();
    jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), claims, &key).unwrap()
}

pub fn claims(sub: &str, roles: &[&str]) -> Value {
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": sub,
        "exp": chrono::Utc::now().timestamp() + 300,
        "email": format!("{sub}@example.com"),
        "roles": roles,
    })
}

/// A valid access token for `sub` carrying `roles`.
pub fn mint(sub: &str, roles: &[&str]) -> String {
    sign(&claims(sub, roles))
}
