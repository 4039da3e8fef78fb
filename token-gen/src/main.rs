use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use clap::Parser;
use ed25519_dalek::{
    Signer, SigningKey,
    pkcs8::{DecodePrivateKey, EncodePublicKey, spki::der::pem::LineEnding},
};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Mint an EdDSA access token for local testing of the user directory API.
///
/// - Header: alg=EdDSA, typ=JWT
/// - Claims: iss, aud, sub, iat, exp, jti, optional email, roles under `--roles-claim`
///   (a dotted path such as `realm_access.roles` nests the array)
/// - Outputs the token, and with `--print-public-pem` the matching
///   `ACCESS_JWT_PUBLIC_KEY_PEM` value
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// Path to the issuer's Ed25519 private key in PEM (PKCS#8)
    #[arg(long, value_name = "FILE")]
    private_pem: PathBuf,

    /// Subject (becomes the caller's username on the server)
    #[arg(long)]
    sub: String,

    #[arg(long)]
    email: Option<String>,

    /// Role name, repeatable: --role ADMIN --role OPERATOR
    #[arg(long = "role")]
    roles: Vec<String>,

    /// Claim path the roles are written to
    #[arg(long, default_value = "roles")]
    roles_claim: String,

    #[arg(long)]
    issuer: String,

    #[arg(long)]
    audience: String,

    /// Lifetime in seconds
    #[arg(long, default_value_t = 900)]
    ttl: i64,

    /// Override jti. Default: random UUID v4.
    #[arg(long)]
    jti: Option<String>,

    /// Also print the public key PEM for the server config
    #[arg(long, default_value_t = false)]
    print_public_pem: bool,
}

fn b64url_json(value: &Value) -> Result<String, serde_json::Error> {
    let s = serde_json::to_string(value)?;
    Ok(URL_SAFE_NO_PAD.encode(s.as_bytes()))
}

fn now_unix() -> Result<i64, std::time::SystemTimeError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64)
}

/// Insert `value` at a dotted `path`, creating intermediate objects.
fn insert_at(claims: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            claims.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = claims
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                insert_at(inner, rest, value);
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let pem = fs::read_to_string(&args.private_pem)?;
    let signing_key = SigningKey::from_pkcs8_pem(&pem)?;

    let iat = now_unix()?;
    let jti = args.jti.unwrap_or_else(|| Uuid::new_v4().to_string());

    let header = json!({ "alg": "EdDSA", "typ": "JWT" });

    let mut claims = Map::new();
    claims.insert("iss".to_string(), Value::String(args.issuer));
    claims.insert("aud".to_string(), Value::String(args.audience));
    claims.insert("sub".to_string(), Value::String(args.sub));
    claims.insert("iat".to_string(), Value::Number(iat.into()));
    claims.insert("exp".to_string(), Value::Number((iat + args.ttl).into()));
    claims.insert("jti".to_string(), Value::String(jti));
    if let Some(email) = args.email {
        claims.insert("email".to_string(), Value::String(email));
    }
    let roles = args.roles.into_iter().map(Value::String).collect();
    insert_at(&mut claims, &args.roles_claim, Value::Array(roles));

    let signing_input = format!(
        "{}.{}",
        b64url_json(&header)?,
        b64url_json(&Value::Object(claims))?
    );
    let sig = signing_key.sign(signing_input.as_bytes());
    let token = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(sig.to_bytes()));

    println!("{token}");

    if args.print_public_pem {
        let public_pem = signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| e.to_string())?;
        eprintln!();
        eprintln!("ACCESS_JWT_PUBLIC_KEY_PEM:");
        eprint!("{public_pem}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_roles_claim() {
        let mut claims = Map::new();
        insert_at(&mut claims, "realm_access.roles", json!(["ADMIN"]));
        assert_eq!(
            Value::Object(claims),
            json!({ "realm_access": { "roles": ["ADMIN"] } })
        );
    }

    #[test]
    fn top_level_roles_claim() {
        let mut claims = Map::new();
        insert_at(&mut claims, "roles", json!(["USER"]));
        assert_eq!(Value::Object(claims), json!({ "roles": ["USER"] }));
    }

    #[test]
    fn public_pem_is_spki() {
        let key = SigningKey::from_bytes(&[1u8; 32]);
        let pem = key.verifying_key().to_public_key_pem(LineEnding::LF).unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
    }
}
