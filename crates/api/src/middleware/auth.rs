//! Bearer token authentication.
//!
//! Provides the [`RequireAuth`] extractor for route handlers.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, UNAUTHORIZED_ACTION, set_sentry_user};
use crate::models::{AccessToken, User};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 when the `Authorization` header is missing or the token
/// does not validate.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(auth: RequireAuth) -> Result<Json<User>> {
///     auth.require(Abilities::USERS_READ)?;
///     Ok(Json(auth.user))
/// }
/// ```
pub struct RequireAuth {
    pub user: User,
    /// The token that authenticated this request.
    pub token: AccessToken,
}

impl RequireAuth {
    /// Check that the token's scope covers `ability`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if it does not.
    pub fn require(&self, ability: &str) -> Result<(), AppError> {
        if self.token.can(ability) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user.id,
                token_id = %self.token.id,
                ability,
                "Token lacks ability"
            );
            Err(AppError::Forbidden(UNAUTHORIZED_ACTION.to_owned()))
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::Unauthenticated)?;

        let (user, token) = state.tokens().validate(presented).await?;

        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self { user, token })
    }
}

/// The credential of a `Bearer` authorization header.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, credential) = header.trim().split_once(' ')?;
    let credential = credential.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !credential.is_empty()).then_some(credential)
}
