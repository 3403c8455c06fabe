//! Password hashing seam.
//!
//! `Argon2PasswordHasher` stores Argon2id hashes in PHC string format
//! (`$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`), so parameters travel with
//! each hash and can be raised later without breaking stored credentials.
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// False for a wrong password and for a stored value that does not parse.
    fn verify(&self, password: &str, stored: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        // 16 random bytes from a v4 UUID
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
            .map_err(|e| HashError(e.to_string()))?;

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError(e.to_string()))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
