//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockroom_core::{Email, UserId};

use super::password::{HashedPassword, PasswordError};

/// An account holder (domain type).
///
/// Serializes to the public JSON shape; the password hash is never included.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Unique email address.
    pub email: Email,
    /// Unique login name.
    pub username: String,
    /// Unique URL slug derived from the email.
    pub slug: String,
    #[serde(skip)]
    password: HashedPassword,
    /// Inactive accounts cannot log in.
    pub is_active: bool,
    /// Staff may manage every account.
    pub is_staff: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Assemble a user from stored fields.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: UserId,
        first_name: Option<String>,
        last_name: Option<String>,
        email: Email,
        username: String,
        slug: String,
        password: HashedPassword,
        flags: UserFlags,
        email_verified_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            email,
            username,
            slug,
            password,
            is_active: flags.is_active,
            is_staff: flags.is_staff,
            email_verified_at,
            created_at,
            updated_at,
        }
    }

    /// Replace the password with a validated, hashed plaintext.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Policy` if the plaintext is too weak.
    pub fn set_password(&mut self, plaintext: &str) -> Result<(), PasswordError> {
        self.password = HashedPassword::from_plaintext(plaintext)?;
        Ok(())
    }

    /// Check a plaintext password.
    #[must_use]
    pub fn verify_password(&self, plaintext: &str) -> bool {
        self.password.verify(plaintext)
    }

    /// The stored hash.
    #[must_use]
    pub const fn password(&self) -> &HashedPassword {
        &self.password
    }

    /// Summary returned after registration.
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Account flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserFlags {
    pub is_active: bool,
    pub is_staff: bool,
}

impl Default for UserFlags {
    fn default() -> Self {
        Self {
            is_active: true,
            is_staff: false,
        }
    }
}

/// `{id, username, email}`.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: Email,
}

/// A user about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Email,
    pub username: String,
    pub slug: String,
    pub password: HashedPassword,
    pub flags: UserFlags,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User::from_parts(
            UserId::new(1),
            Some("Jane".to_string()),
            None,
            Email::parse("jane@example.com").unwrap(),
            "jane".to_string(),
            "jane-at-examplecom".to_string(),
            HashedPassword::from_plaintext("Password1!").unwrap(),
            UserFlags::default(),
            None,
            now,
            now,
        )
    }

    #[test]
    fn test_password_is_never_serialized() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "jane@example.com");
        assert_eq!(json["is_active"], true);
        assert_eq!(json["last_name"], serde_json::Value::Null);
    }

    #[test]
    fn test_set_password_validates() {
        let mut user = user();
        assert!(user.set_password("short").is_err());
        assert!(user.verify_password("Password1!"));

        user.set_password("NewPassword2@").unwrap();
        assert!(user.verify_password("NewPassword2@"));
        assert!(!user.verify_password("Password1!"));
    }
}
