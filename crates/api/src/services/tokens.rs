//! Personal access tokens.
//!
//! A token is presented as `"<id>|<secret>"`. The secret is 32 random bytes,
//! base64url-encoded; only its SHA-256 digest is stored, so a leaked table
//! cannot be replayed.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use secrecy::SecretString;
use sha2::{Digest, Sha256};

use stockroom_core::{Abilities, TokenId};

use super::auth::AuthError;
use crate::db::{Repositories, RepositoryError, TokenStore, UserStore};
use crate::models::{AccessToken, NewAccessToken, NewToken, User};

/// Name given to tokens issued at login.
pub const LOGIN_TOKEN_NAME: &str = "auth_token";

const SECRET_BYTES: usize = 32;

/// Issues, validates and revokes bearer tokens.
pub struct TokenIssuer<'a> {
    tokens: &'a dyn TokenStore,
    users: &'a dyn UserStore,
}

impl<'a> TokenIssuer<'a> {
    #[must_use]
    pub fn new(repos: &'a Repositories) -> Self {
        Self {
            tokens: repos.tokens.as_ref(),
            users: repos.users.as_ref(),
        }
    }

    /// Store a new token for `user` and return its plaintext once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the token cannot be stored.
    pub async fn issue(
        &self,
        user: &User,
        name: &str,
        abilities: Abilities,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<NewToken, RepositoryError> {
        let secret = generate_secret();
        let token = self
            .tokens
            .create(NewAccessToken {
                user_id: user.id,
                name: name.to_owned(),
                token_hash: hash_token(&secret),
                abilities,
                expires_at,
            })
            .await?;

        tracing::debug!(user_id = %user.id, token_id = %token.id, name, "Issued token");

        let plaintext = SecretString::from(format!("{}|{secret}", token.id));
        Ok(NewToken { token, plaintext })
    }

    /// Resolve a presented bearer value to its user and token.
    ///
    /// Accepts `"<id>|<secret>"` or a bare secret. Stamps `last_used_at`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` when the token is unknown, its id
    /// does not match, it has expired, or its user no longer exists.
    pub async fn validate(&self, presented: &str) -> Result<(User, AccessToken), AuthError> {
        let (id, secret) = match presented.split_once('|') {
            Some((id, secret)) => {
                let id = id
                    .parse::<TokenId>()
                    .map_err(|_| AuthError::Unauthenticated)?;
                (Some(id), secret)
            }
            None => (None, presented),
        };
        if secret.is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        let mut token = self
            .tokens
            .find_by_hash(&hash_token(secret))
            .await?
            .ok_or(AuthError::Unauthenticated)?;
        if id.is_some_and(|id| id != token.id) {
            return Err(AuthError::Unauthenticated);
        }

        let now = Utc::now();
        if token.is_expired(now) {
            return Err(AuthError::Unauthenticated);
        }

        let user = self
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        self.tokens.touch(token.id, now).await?;
        token.last_used_at = Some(now);

        Ok((user, token))
    }

    /// Delete a token. Returns `false` if it was already gone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the delete fails.
    pub async fn revoke(&self, id: TokenId) -> Result<bool, RepositoryError> {
        self.tokens.delete(id).await
    }

    /// Delete tokens that expired more than `older_than` ago.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the delete fails.
    pub async fn prune_expired(&self, older_than: Duration) -> Result<u64, RepositoryError> {
        let cutoff = Utc::now() - older_than;
        let pruned = self.tokens.prune_expired(cutoff).await?;
        tracing::info!(pruned, %cutoff, "Pruned expired tokens");
        Ok(pruned)
    }
}

/// Hex-encoded SHA-256 of a token secret.
#[must_use]
pub fn hash_token(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
