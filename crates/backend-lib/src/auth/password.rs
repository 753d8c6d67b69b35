// ============================
// authgate-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use thiserror::Error;
use zeroize::Zeroize;

/// scrypt block size
const SCRYPT_R: u32 = 8;
/// scrypt parallelism
const SCRYPT_P: u32 = 1;
/// Derived key length in bytes
const SCRYPT_OUTPUT_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("invalid scrypt parameters: {0}")]
    InvalidParams(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// scrypt hasher with a configurable work factor
#[derive(Debug, Clone, Copy)]
pub struct ScryptHasher {
    params: Params,
}

impl ScryptHasher {
    /// `log_n` is log2 of the scrypt cost parameter N
    pub fn new(log_n: u8) -> Result<Self, PasswordError> {
        let params = Params::new(log_n, SCRYPT_R, SCRYPT_P, SCRYPT_OUTPUT_LEN)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    /// Hash a password into a PHC string
    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, self.params, &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Hash a password and zeroize the original
    pub fn hash_secure(&self, plain: &mut String) -> Result<String, PasswordError> {
        let hash = self.hash(plain);
        plain.zeroize();
        hash
    }

    /// Verify a password against a PHC string. Cost is read from the hash.
    pub fn verify(&self, hash: &str, plain: &str) -> bool {
        verify_password(hash, plain)
    }
}

/// Verify a password against a hash
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}
