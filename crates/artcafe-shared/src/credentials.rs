//! Password hashing and session token helpers.
//!
//! Passwords are stored as Argon2id PHC strings (`$argon2id$v=19$...`), which
//! carry their own salt and cost parameters. Session tokens are random bytes
//! handed to the client once; only their BLAKE3 digest is ever persisted.

use argon2::password_hash::{self, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::{KDF_CONTEXT_SESSION, PASSWORD_SALT_SIZE, SESSION_TOKEN_SIZE};
use crate::error::SharedError;

/// Hash a password under a fresh random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, SharedError> {
    let mut salt = [0u8; PASSWORD_SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt)?;

    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string.
///
/// A mismatch is `Ok(false)`; a malformed stored hash is an error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, SharedError> {
    let parsed = password_hash::PasswordHash::new(stored)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Generate a new opaque bearer token (hex).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_SIZE];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest under which a session token is stored and looked up.
pub fn session_token_digest(token: &str) -> String {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_SESSION);
    hasher.update(token.as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let stored = hash_password("hunter22").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &stored).unwrap());
        assert!(!verify_password("hunter23", &stored).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a).unwrap());
        assert!(verify_password("same-password", &b).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
        assert!(verify_password("anything", "").is_err());
    }

    #[test]
    fn session_tokens_are_unique_and_digest_is_stable() {
        let t1 = generate_session_token();
        let t2 = generate_session_token();
        assert_ne!(t1, t2);
        assert_eq!(t1.len(), SESSION_TOKEN_SIZE * 2);
        assert_eq!(session_token_digest(&t1), session_token_digest(&t1));
        assert_ne!(session_token_digest(&t1), session_token_digest(&t2));
    }
}
