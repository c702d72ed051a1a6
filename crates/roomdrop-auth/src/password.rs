//! Argon2id password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use roomdrop_core::traits::PasswordHasher;
use roomdrop_core::{ShareError, ShareResult};

/// Password hasher using Argon2id with a random salt per hash.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plain: &str) -> ShareResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| ShareError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    fn verify(&self, plain: &str, hash: &str) -> ShareResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| ShareError::internal(format!("Invalid password hash format: {e}")))?;

        let argon2 = Argon2::default();
        match argon2.verify_password(plain.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ShareError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}
