//! Hashed passwords.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

use stockroom_core::{PasswordPolicyError, validate_password_strength};

/// Errors raised while setting a password.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The plaintext broke the strength policy.
    #[error(transparent)]
    Policy(#[from] PasswordPolicyError),

    /// The value is not a PHC-format hash.
    #[error("value is not a recognized password hash")]
    UnrecognizedHash,

    /// Argon2 failed to hash the password.
    #[error("password hashing error")]
    Hash,
}

/// An Argon2id hash in PHC string format.
///
/// There are two ways to obtain one: [`HashedPassword::from_plaintext`]
/// checks the strength policy and hashes, [`HashedPassword::from_hash`]
/// accepts an existing hash without touching it.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Validate and hash a plaintext password.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Policy` listing every broken rule, or
    /// `PasswordError::Hash` if hashing fails.
    pub fn from_plaintext(plaintext: &str) -> Result<Self, PasswordError> {
        validate_password_strength(plaintext)?;
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| Self(hash.to_string()))
            .map_err(|_| PasswordError::Hash)
    }

    /// Wrap a stored hash.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::UnrecognizedHash` if `hash` is not a PHC
    /// string.
    pub fn from_hash(hash: impl Into<String>) -> Result<Self, PasswordError> {
        let hash = hash.into();
        if PasswordHash::new(&hash).is_err() {
            return Err(PasswordError::UnrecognizedHash);
        }
        Ok(Self(hash))
    }

    /// Check a plaintext password against this hash.
    #[must_use]
    pub fn verify(&self, plaintext: &str) -> bool {
        PasswordHash::new(&self.0).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
    }

    /// The PHC string, for persistence.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HashedPassword([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = HashedPassword::from_plaintext("Password1!").unwrap();
        assert!(hashed.as_str().starts_with("$argon2id$"));
        assert!(hashed.verify("Password1!"));
        assert!(!hashed.verify("Password1?"));
    }

    #[test]
    fn test_weak_plaintext_rejected() {
        let err = HashedPassword::from_plaintext("password").unwrap_err();
        let PasswordError::Policy(policy) = err else {
            panic!("expected a policy error");
        };
        assert_eq!(policy.violations().len(), 3);
    }

    #[test]
    fn test_hash_lookalike_goes_through_policy() {
        // A PHC-looking plaintext is still just a plaintext.
        let existing = HashedPassword::from_plaintext("Password1!").unwrap();
        let rehashed = HashedPassword::from_plaintext(existing.as_str());
        assert!(rehashed.is_err() || rehashed.unwrap().as_str() != existing.as_str());
    }

    #[test]
    fn test_from_hash_accepts_only_phc_strings() {
        let existing = HashedPassword::from_plaintext("Password1!").unwrap();
        let restored = HashedPassword::from_hash(existing.as_str()).unwrap();
        assert!(restored.verify("Password1!"));

        assert!(matches!(
            HashedPassword::from_hash("Password1!"),
            Err(PasswordError::UnrecognizedHash)
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let hashed = HashedPassword::from_plaintext("Password1!").unwrap();
        assert!(!format!("{hashed:?}").contains("argon2"));
    }
}
