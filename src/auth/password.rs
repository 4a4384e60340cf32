//! Defines the type that handles password validation and hashing.

use std::fmt::Display;

use bcrypt::{hash, verify};

use crate::Error;

/// The minimum number of characters a password must have.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The encryption cost used for hashing passwords.
    ///
    /// Increasing the cost increases the rounds of hashing and therefore the
    /// time needed to verify a password.
    pub const DEFAULT_COST: u32 = 10;

    /// Try to create a password hash from a raw password string.
    ///
    /// `cost` should be [PasswordHash::DEFAULT_COST] outside of tests.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::PasswordTooShort] if the password has fewer than
    ///   [MIN_PASSWORD_LENGTH] characters,
    /// - [Error::HashingError] if the underlying hashing library failed.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        if raw_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::PasswordTooShort(MIN_PASSWORD_LENGTH));
        }

        match hash(raw_password, cost) {
            Ok(password_hash) => Ok(Self(password_hash)),
            Err(e) => Err(Error::HashingError(e.to_string())),
        }
    }

    /// Create a new `PasswordHash` without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` is a valid bcrypt
    /// digest, e.g. a value previously produced by
    /// [PasswordHash::from_raw_password] and stored in the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_string())
    }

    /// Check that `raw_password` matches the stored password.
    ///
    /// Fails closed: an error from the hashing library is reported as "no
    /// match", never as a success.
    pub fn verify(&self, raw_password: &str) -> bool {
        verify(raw_password, &self.0).unwrap_or(false)
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod password_hash_tests {
    use crate::Error;

    use super::PasswordHash;

    /// Minimal cost to keep the test suite fast.
    const TEST_COST: u32 = 4;

    #[test]
    fn verify_password_succeeds_for_valid_password() {
        let hash = PasswordHash::new_unchecked(
            "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm",
        );
        let password = "okon";

        assert!(hash.verify(password));
    }

    #[test]
    fn verify_password_fails_for_invalid_password() {
        let hash = PasswordHash::new_unchecked(
            "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm",
        );
        let password = "thewrongpassword";

        assert!(!hash.verify(password));
    }

    #[test]
    fn verify_fails_closed_on_malformed_digest() {
        // Not a bcrypt digest at all, so the library errors internally.
        let hash = PasswordHash::new_unchecked("not a valid digest");

        assert!(!hash.verify("whatever"));
    }

    #[test]
    fn hash_password_produces_verifiable_hash() {
        let password = "roostersgocockledoodledoo";
        let wrong_password = "the_wrong_password";
        let hash = PasswordHash::from_raw_password(password, TEST_COST).unwrap();

        assert!(hash.verify(password));
        assert!(!hash.verify(wrong_password));
    }

    #[test]
    fn hash_duplicate_password_produces_unique_hash() {
        let password = "turkeysgogobblegobble";
        let hash = PasswordHash::from_raw_password(password, TEST_COST).unwrap();
        let dupe_hash = PasswordHash::from_raw_password(password, TEST_COST).unwrap();

        assert_ne!(hash, dupe_hash);
    }

    #[test]
    fn from_raw_password_fails_on_short_password() {
        let result = PasswordHash::from_raw_password("five5", TEST_COST);

        assert_eq!(result, Err(Error::PasswordTooShort(6)));
    }

    #[test]
    fn from_raw_password_accepts_six_characters() {
        let result = PasswordHash::from_raw_password("secret", TEST_COST);

        assert!(result.is_ok());
    }
}
