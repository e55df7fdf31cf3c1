//! HMAC-signed opaque tokens and the password indirection built on them.
//!
//! A password-protected share stores nothing password-derived. The Argon2id
//! hash is computed once at creation, wrapped in a token signed with the
//! server secret, and handed back to the creator. At view time the caller
//! resubmits both the password and the token; the signature proves the
//! token was honestly issued, the hash inside it verifies the password.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Sign a claims payload with the server secret (HS256).
pub fn sign_token<T: Serialize>(
    claims: &T,
    secret: &[u8],
) -> Result<String, jsonwebtoken::errors::Error> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret))
}

/// Verify a token's signature and recover its claims. Any malformed,
/// truncated, or mis-signed token is `None` — verification is
/// constant-time inside the decoder and never an exception side channel.
pub fn verify_token<T: DeserializeOwned>(token: &str, secret: &[u8]) -> Option<T> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<T>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .ok()
}

#[derive(Debug, Serialize, Deserialize)]
struct PasswordClaims {
    /// Argon2id PHC hash of the share password
    h: String,
}

/// Hash the password (slow, memory-hard) and wrap the hash in a signed
/// token. Called once at share creation; the result goes to the creator,
/// never to storage.
pub fn issue_password_token(password: &str, secret: &[u8]) -> Result<String, StoreError> {
    let hash = hash_password(password)?;
    Ok(sign_token(&PasswordClaims { h: hash }, secret)?)
}

/// Check a caller-supplied token and password. Signature first — a forged
/// token is rejected before any password comparison happens.
pub fn verify_password_token(token: &str, password: &str, secret: &[u8]) -> bool {
    let Some(claims) = verify_token::<PasswordClaims>(token, secret) else {
        return false;
    };
    verify_password(password, &claims.h)
}

// Argon2id, OWASP parameters: 64 MiB memory, 3 iterations, 4 lanes.
fn argon2() -> Result<Argon2<'static>, StoreError> {
    let params = Params::new(64 * 1024, 3, 4, None)
        .map_err(|e| StoreError::PasswordHash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
