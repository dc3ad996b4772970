//! Credential verifier (bcrypt).
//!
//! `verify` is the only piece the authentication core needs; `hash` is used by
//! the account service when a user registers.

/// Lowest cost bcrypt accepts. Only sensible for tests.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Check `plaintext` against a stored bcrypt hash.
///
/// A malformed or unsupported hash is a non-match, not an error.
pub fn verify(plaintext: &str, hashed: &str) -> bool {
    bcrypt::verify(plaintext, hashed).unwrap_or(false)
}

pub fn hash(plaintext: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_password_verifies() {
        let hashed = hash("s3cret!", MIN_COST).unwrap();
        assert!(verify("s3cret!", &hashed));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hashed = hash("s3cret!", MIN_COST).unwrap();
        assert!(!verify("s3cret?", &hashed));
        assert!(!verify("", &hashed));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash("same", MIN_COST).unwrap();
        let b = hash("same", MIN_COST).unwrap();
        assert_ne!(a, b);
        assert!(verify("same", &a) && verify("same", &b));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify("anything", "not-a-bcrypt-hash"));
        assert!(!verify("anything", ""));
    }
}
