//! Authentication service.
//!
//! Exchanges credentials for bearer tokens and revokes them again.

mod error;

pub use error::AuthError;

use chrono::{DateTime, Duration, Utc};

use stockroom_core::{Abilities, Email};

use super::tokens::{LOGIN_TOKEN_NAME, TokenIssuer};
use crate::db::{Repositories, UserStore};
use crate::models::{AccessToken, NewToken, User};

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    tokens: TokenIssuer<'a>,
    token_ttl: Option<Duration>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service. Login tokens expire after
    /// `token_ttl`, or never when it is `None`.
    #[must_use]
    pub fn new(repos: &'a Repositories, token_ttl: Option<Duration>) -> Self {
        Self {
            users: repos.users.as_ref(),
            tokens: TokenIssuer::new(repos),
            token_ttl,
        }
    }

    /// Login with an email or username and a password.
    ///
    /// The identifier is looked up by email when it parses as one and by
    /// username otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user does not exist,
    /// the password is wrong, or the account is inactive.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(User, NewToken), AuthError> {
        let identifier = identifier.trim();
        let user = match Email::parse(identifier) {
            Ok(email) => self.users.find_by_email(&email).await?,
            Err(_) => self.users.find_by_username(identifier).await?,
        };

        let Some(user) = user else {
            tracing::info!(identifier, reason = "unknown", "Login failed");
            return Err(AuthError::InvalidCredentials);
        };
        if !user.verify_password(password) {
            tracing::info!(user_id = %user.id, reason = "password", "Login failed");
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            tracing::warn!(user_id = %user.id, reason = "inactive", "Login failed");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(&user, LOGIN_TOKEN_NAME, Abilities::all(), self.expires_at())
            .await?;

        tracing::info!(user_id = %user.id, token_id = %token.token.id, "User logged in");
        Ok((user, token))
    }

    /// Revoke the token used for the current request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn logout(&self, user: &User, token: &AccessToken) -> Result<(), AuthError> {
        self.tokens.revoke(token.id).await?;
        tracing::info!(user_id = %user.id, token_id = %token.id, "User logged out");
        Ok(())
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.token_ttl.map(|ttl| Utc::now() + ttl)
    }
}
