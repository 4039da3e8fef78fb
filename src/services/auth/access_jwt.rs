use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{error::Error as StdError, fmt};

use crate::services::authz::Principal;

// Errors returned by access-token verification + strict claim validation.
#[derive(Debug)]
pub enum AccessJwtError {
    InvalidKey(jsonwebtoken::errors::Error),
    Jwt(jsonwebtoken::errors::Error),
    MissingOrInvalidAud,
    EmptyClaim(&'static str),
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey(e) => write!(f, "invalid ed25519 public key pem: {}", e),
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::MissingOrInvalidAud => write!(f, "missing or invalid 'aud' claim"),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidKey(e) | Self::Jwt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AccessJwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

fn aud_is_present_and_valid(aud: &Value) -> bool {
    match aud {
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(arr) => arr.iter().any(|v| match v {
            Value::String(s) => !s.trim().is_empty(),
            _ => false,
        }),
        // Missing claim ends up as Null due to #[serde(default)]
        _ => false,
    }
}

/// Access token (JWT) claims.
///
/// Anything not named here (including the roles claim, whose name is
/// configurable) lands in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    #[serde(default)]
    pub aud: Value,

    pub sub: String,
    pub exp: u64,

    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read role names from `claims` at a dotted `path` (e.g. `realm_access.roles`).
///
/// The claim may be an array of strings or a single space-separated string.
/// A missing or differently shaped claim yields no roles.
pub fn role_names_at(claims: &Map<String, Value>, path: &str) -> Vec<String> {
    let mut segments = path.split('.').filter(|s| !s.is_empty());

    let Some(first) = segments.next() else {
        return Vec::new();
    };
    let mut node = claims.get(first);
    for segment in segments {
        node = node.and_then(|v| v.get(segment));
    }

    match node {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// EdDSA (Ed25519) access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
    roles_claim: String,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .field("roles_claim", &self.roles_claim)
            .finish()
    }
}

impl AuthService {
    pub fn new(
        access_public_key_pem: &str,
        issuer: &str,
        audience: &str,
        leeway_seconds: u64,
        roles_claim: impl Into<String>,
    ) -> Result<Self, AccessJwtError> {
        let decoding_key = DecodingKey::from_ed_pem(access_public_key_pem.as_bytes())
            .map_err(AccessJwtError::InvalidKey)?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.leeway = leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
            roles_claim: roles_claim.into(),
        })
    }

    pub fn roles_claim(&self) -> &str {
        &self.roles_claim
    }

    // Verify and decode a JWT access token.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify + strict claim validation.
    ///
    /// `jsonwebtoken::Validation` already checks signature, `exp`, `iss` and `aud`.
    /// This additionally requires `iss`, `aud`, `sub` and `exp` to be non-empty.
    pub fn verify_strict(&self, token: &str) -> Result<AccessTokenClaims, AccessJwtError> {
        let claims = self.verify(token)?;

        if claims.iss.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("iss"));
        }
        if claims.sub.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("sub"));
        }
        if claims.exp == 0 {
            return Err(AccessJwtError::EmptyClaim("exp"));
        }
        if !aud_is_present_and_valid(&claims.aud) {
            return Err(AccessJwtError::MissingOrInvalidAud);
        }

        Ok(claims)
    }

    /// Verify a bearer token and turn it into the principal attached to the request.
    ///
    /// This is the entry-point for the bearer middleware.
    pub fn verify_principal(&self, token: &str) -> Result<Principal, AccessJwtError> {
        let claims = self.verify_strict(token)?;
        let authorities = role_names_at(&claims.extra, &self.roles_claim);

        Ok(Principal {
            subject: claims.sub,
            email: claims.email.filter(|e| !e.trim().is_empty()),
            authorities,
            jti: claims.jti,
        })
    }
}
