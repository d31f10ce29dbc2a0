use bcrypt::{hash, verify, BcryptError};

/// Hash a password with the configured bcrypt work factor.
pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    hash(password, cost)
}

/// Check a password against a stored bcrypt hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, BcryptError> {
    verify(password, password_hash)
}

#[cfg(test)]
mod test {
    use super::*;

    // Minimum cost keeps the test fast; production cost comes from config.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hashed = hash_password("correct horse", TEST_COST).unwrap();
        assert!(verify_password("correct horse", &hashed).unwrap());
        assert!(!verify_password("wrong horse", &hashed).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("same password", TEST_COST).unwrap();
        let second = hash_password("same password", TEST_COST).unwrap();
        assert_ne!(first, second);
    }
}
