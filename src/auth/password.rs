use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::AppResult;

/// Credential hashing collaborator. Implementations must never log or expose
/// plaintext or stored hashes.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> AppResult<String>;
    fn verify(&self, plaintext: &str, stored: &str) -> bool;
}

/// Argon2id with per-hash random salts.
pub struct Argon2Credentials;

impl CredentialHasher for Argon2Credentials {
    fn hash(&self, plaintext: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
