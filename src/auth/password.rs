use crate::error::AppError;
use bcrypt::{hash, verify};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// One-way hashing of secrets before they are persisted.
pub trait Hasher: Send + Sync {
    fn hash(&self, secret: &str) -> Result<String, AppError>;
    fn verify(&self, secret: &str, hashed: &str) -> Result<bool, AppError>;
}

/// Salted bcrypt, used for passwords.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl Hasher for BcryptHasher {
    fn hash(&self, secret: &str) -> Result<String, AppError> {
        hash(secret, self.cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, secret: &str, hashed: &str) -> Result<bool, AppError> {
        verify(secret, hashed)
            .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
    }
}

/// Hex SHA-256 digest, used for refresh tokens.
///
/// Refresh tokens are long random JWTs, well past bcrypt's 72-byte input limit,
/// so bcrypt would only ever see their shared header prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash(&self, secret: &str) -> Result<String, AppError> {
        Ok(hex::encode(Sha256::digest(secret.as_bytes())))
    }

    fn verify(&self, secret: &str, hashed: &str) -> Result<bool, AppError> {
        let candidate = self.hash(secret)?;
        Ok(candidate.as_bytes().ct_eq(hashed.as_bytes()).into())
    }
}
