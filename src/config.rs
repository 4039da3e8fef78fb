/*
 * Responsibility
 * - Load settings from the environment (.env is honoured via dotenvy)
 * - Validate them up front; anything missing or malformed fails startup
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    // None → in-memory user repository
    pub database_url: Option<String>,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth_issuer: String,
    pub auth_audience: String,
    pub access_token_leeway_seconds: u64,
    pub access_jwt_public_key_pem: String,
    // Claim (dotted path) that carries role names
    pub auth_roles_claim: String,

    pub http_body_limit_bytes: usize,
    pub http_timeout_seconds: u64,
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parsed_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parsed_or("PORT", 3000)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let database_url = optional("DATABASE_URL");

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_issuer = required("AUTH_ISSUER")?;
        // Issuers are absolute URLs (e.g. the identity provider realm).
        url::Url::parse(&auth_issuer).map_err(|_| ConfigError::Invalid("AUTH_ISSUER"))?;

        let auth_audience = required("AUTH_AUDIENCE")?;

        let access_token_leeway_seconds = parsed_or("ACCESS_TOKEN_LEEWAY_SECONDS", 60)?;

        let access_jwt_public_key_pem =
            required("ACCESS_JWT_PUBLIC_KEY_PEM")?.replace("\\n", "\n");

        let auth_roles_claim = optional("AUTH_ROLES_CLAIM").unwrap_or_else(|| "roles".to_string());

        let http_body_limit_bytes = parsed_or("HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let http_timeout_seconds: u64 = parsed_or("HTTP_TIMEOUT_SECONDS", 30)?;
        if http_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("HTTP_TIMEOUT_SECONDS"));
        }

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            access_jwt_public_key_pem,
            auth_roles_claim,
            http_body_limit_bytes,
            http_timeout_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_env_parsing() {
        assert_eq!(AppEnv::parse("production"), AppEnv::Production);
        assert_eq!(AppEnv::parse(" PROD "), AppEnv::Production);
        assert_eq!(AppEnv::parse("staging"), AppEnv::Development);
        assert!(!AppEnv::parse("").is_production());
    }

    #[test]
    fn config_error_messages() {
        assert_eq!(
            ConfigError::Missing("AUTH_ISSUER").to_string(),
            "missing configuration: AUTH_ISSUER"
        );
        assert_eq!(
            ConfigError::Invalid("PORT").to_string(),
            "invalid configuration: PORT"
        );
    }
}
