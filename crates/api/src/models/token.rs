//! Personal access token types.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use stockroom_core::{Abilities, TokenId, UserId};

/// A stored personal access token.
///
/// Only the SHA-256 digest of the secret is kept; the plaintext exists
/// once, in the [`NewToken`] returned at issue time.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub id: TokenId,
    /// Owner of the token.
    pub user_id: UserId,
    /// Free-form label, e.g. `"auth_token"` or an integration name.
    pub name: String,
    pub abilities: Abilities,
    pub last_used_at: Option<DateTime<Utc>>,
    /// `None` means the token never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether the token's scope covers `ability`.
    #[must_use]
    pub fn can(&self, ability: &str) -> bool {
        self.abilities.can(ability)
    }
}

/// A token row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewAccessToken {
    pub user_id: UserId,
    pub name: String,
    /// Hex-encoded SHA-256 of the secret.
    pub token_hash: String,
    pub abilities: Abilities,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A freshly issued token and its one-time plaintext (`"<id>|<secret>"`).
#[derive(Debug)]
pub struct NewToken {
    pub token: AccessToken,
    pub plaintext: SecretString,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn token(expires_at: Option<DateTime<Utc>>) -> AccessToken {
        let now = Utc::now();
        AccessToken {
            id: TokenId::new(1),
            user_id: UserId::new(1),
            name: "auth_token".to_string(),
            abilities: Abilities::new([Abilities::PRODUCTS_READ]),
            last_used_at: None,
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        assert!(!token(None).is_expired(now));
        assert!(!token(Some(now + Duration::hours(1))).is_expired(now));
        assert!(token(Some(now - Duration::seconds(1))).is_expired(now));
    }

    #[test]
    fn test_scope() {
        let token = token(None);
        assert!(token.can(Abilities::PRODUCTS_READ));
        assert!(!token.can(Abilities::PRODUCTS_WRITE));
    }
}
