use argon2::password_hash::{rand_core::OsRng as SaltRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::models::{IssuedToken, TokenError, MAX_PASSWORD_CHARS, MIN_PASSWORD_CHARS, RAW_TOKEN_BYTES};

/// Mints a single-use token valid for `ttl`. The raw value goes to the user;
/// only its SHA-256 digest is stored.
pub fn issue_raw_token(ttl: Duration) -> IssuedToken {
    let mut bytes = [0u8; RAW_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let raw_token = hex::encode(bytes);
    let hash = hash_token(&raw_token);

    IssuedToken {
        raw_token,
        hash,
        expires_at: Utc::now() + ttl,
    }
}

pub fn hash_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Shape check only; a well-formed token can still be unknown or expired.
pub fn is_well_formed(raw_token: &str) -> bool {
    raw_token.len() == RAW_TOKEN_BYTES * 2 && raw_token.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn validate_new_password(password: &str) -> Result<(), TokenError> {
    let length = password.chars().count();
    if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&length) {
        return Err(TokenError::ValidationError(format!(
            "Password must be between {} and {} characters",
            MIN_PASSWORD_CHARS, MAX_PASSWORD_CHARS
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, TokenError> {
    let salt = SaltString::generate(&mut SaltRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| TokenError::HashingError(e.to_string()))?;
    Ok(password_hash.to_string())
}
