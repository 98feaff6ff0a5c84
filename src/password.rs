//! Salted one-way hashing for passwords and refresh-token fingerprints.
//!
//! Inputs are reduced with SHA-256 before bcrypt so values longer than
//! bcrypt's 72-byte limit (signed refresh tokens) are covered in full.

use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost.
    /// The cost should already be validated with `config::validate_hash_cost`.
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext value with a fresh salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(prehash(plaintext), self.cost)
    }

    /// Check a plaintext value against a stored digest.
    /// A malformed digest never matches.
    pub fn compare(&self, plaintext: &str, digest: &str) -> bool {
        match bcrypt::verify(prehash(plaintext), digest) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "Stored digest could not be parsed");
                false
            }
        }
    }
}

fn prehash(plaintext: &str) -> String {
    STANDARD.encode(Sha256::digest(plaintext.as_bytes()))
}
