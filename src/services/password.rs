// SPDX-License-Identifier: MIT

//! Password hashing with bcrypt.

use crate::error::AppError;

/// One-way password hashing with a cost factor bound at startup.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password. Only fails on internal bcrypt failure,
    /// never on valid input.
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        bcrypt::hash(plaintext, self.cost)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
    }

    /// Verify a plaintext against a stored digest.
    ///
    /// Returns false on mismatch and on an undecodable digest; verification
    /// never surfaces an error to the caller.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps these tests fast.
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_verify_roundtrip() {
        let hasher = PasswordHasher::new(TEST_COST);
        let digest = hasher.hash("secret123").unwrap();

        assert!(hasher.verify("secret123", &digest));
        assert!(!hasher.verify("secret124", &digest));
        assert!(!hasher.verify("", &digest));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new(TEST_COST);
        let a = hasher.hash("secret123").unwrap();
        let b = hasher.hash("secret123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_garbage_digest_is_false_not_error() {
        let hasher = PasswordHasher::new(TEST_COST);
        assert!(!hasher.verify("secret123", "not-a-bcrypt-digest"));
    }
}
