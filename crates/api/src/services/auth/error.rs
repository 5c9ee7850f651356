//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identifier, wrong password, or inactive account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, unknown, expired, or orphaned bearer token.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// The only login failure message clients ever see.
    pub const FAILED_MESSAGE: &'static str = "These credentials do not match our records.";
}
