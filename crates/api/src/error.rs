//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`, and every variant renders as a JSON body.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::products::ProductError;
use crate::services::users::UserError;
use crate::storage::StorageError;
use crate::validation::ValidationErrors;

/// Message for requests without a usable bearer token.
pub const UNAUTHENTICATED: &str = "You are not authenticated";

/// Message for tokens that lack a required ability.
pub const UNAUTHORIZED_ACTION: &str = "This action is unauthorized.";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// File storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// One or more input fields are invalid.
    #[error("Validation failed: {}", .0.summary())]
    Validation(ValidationErrors),

    /// No valid bearer token.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Authenticated, but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found. Holds the resource name, e.g. `"User"`.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::Conflict(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
                AuthError::Repository(RepositoryError::Conflict(_)) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match self {
            Self::Validation(errors) => validation_body(&errors),
            Self::Auth(AuthError::InvalidCredentials) => {
                validation_body(&ValidationErrors::single(
                    "email_or_username",
                    AuthError::FAILED_MESSAGE,
                ))
            }
            Self::Auth(AuthError::Unauthenticated) | Self::Unauthenticated => {
                json!({ "errors": UNAUTHENTICATED })
            }
            Self::Database(RepositoryError::Conflict(message))
            | Self::Auth(AuthError::Repository(RepositoryError::Conflict(message))) => {
                json!({ "errors": message })
            }
            Self::Forbidden(message) | Self::BadRequest(message) => json!({ "errors": message }),
            Self::NotFound(resource) => json!({ "error": format!("{resource} not found") }),
            Self::Database(RepositoryError::NotFound) => json!({ "error": "Not found" }),
            Self::Database(_) | Self::Storage(_) | Self::Auth(_) | Self::Internal(_) => {
                json!({ "error": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(errors) => Self::Validation(errors),
            UserError::Forbidden(reason) => Self::Forbidden(reason.to_owned()),
            UserError::NotFound => Self::NotFound("User"),
            UserError::Repository(e) => Self::Database(e),
            UserError::PasswordHash => Self::Auth(AuthError::PasswordHash),
        }
    }
}

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::Validation(errors) => Self::Validation(errors),
            ProductError::NotFound => Self::NotFound("Product"),
            ProductError::Repository(e) => Self::Database(e),
            ProductError::Storage(e) => Self::Storage(e),
        }
    }
}

fn validation_body(errors: &ValidationErrors) -> serde_json::Value {
    json!({ "message": errors.summary(), "errors": errors })
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body extractor whose rejections render as `AppError::BadRequest`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

/// Map a JSON extraction failure to a client error.
#[must_use]
pub fn json_rejection(rejection: &JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
