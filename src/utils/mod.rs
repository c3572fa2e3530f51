// Utility functions

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Bearer token lifetime
const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password against a stored hash. Malformed hashes count as a
/// mismatch rather than an error.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    /// Expiry, seconds since the epoch
    pub exp: usize,
}

/// Issue a signed bearer token for the given email
pub fn create_access_token(email: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let expires_at = chrono::Utc::now() + chrono::Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES);
    let claims = Claims {
        sub: email.to_string(),
        exp: expires_at.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and validate a bearer token, returning its claims.
/// Expired or tampered tokens fail here.
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter2-but-longer").unwrap();
        assert!(verify_password("hunter2-but-longer", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip() {
        let token = create_access_token("ops@example.com", "test-secret").unwrap();
        let claims = decode_access_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "ops@example.com");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_access_token("ops@example.com", "secret-a").unwrap();
        assert!(decode_access_token(&token, "secret-b").is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(decode_access_token("definitely.not.a-jwt", "test-secret").is_err());
    }
}
