//! Registration, login and logout.

use axum::{Json, extract::State, http::StatusCode};
use secrecy::ExposeSecret;
use serde_json::{Map, Value, json};

use super::schemas::{
    ErrorMessageSchema, LoginRequest, LoginResponse, RegisterRequest, SuccessSchema,
    ValidationErrorSchema,
};
use crate::error::{ApiJson, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::RequireAuth;
use crate::services::auth::AuthError;
use crate::state::AppState;
use crate::validation::{Field, Validator};

/// Login identifier field; `email` is accepted in its place.
const IDENTIFIER: &str = "email_or_username";

/// Shown after a successful registration.
pub const REGISTERED: &str =
    "User created successfully. Please verify your email to activate your account.";

/// `expires_at` format in login responses.
const EXPIRES_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `POST /api/register`
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = SuccessSchema),
        (status = 422, description = "Invalid input", body = ValidationErrorSchema)
    ),
    tags = ["auth"],
    security(())
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<Map<String, Value>>,
) -> Result<(StatusCode, Json<Value>)> {
    state.users().register(&input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": REGISTERED }))))
}

/// `POST /api/login`
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 422, description = "Missing fields or bad credentials", body = ValidationErrorSchema)
    ),
    tags = ["auth"],
    security(())
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>> {
    let field = if !input.contains_key(IDENTIFIER) && input.contains_key("email") {
        "email"
    } else {
        IDENTIFIER
    };

    let mut v = Validator::new(&input);
    let identifier = v.string(field, true, usize::MAX);
    let password = v.secret("password", true);
    v.finish()?;
    let (Field::Set(identifier), Field::Set(password)) = (identifier, password) else {
        return Err(AuthError::InvalidCredentials.into());
    };

    let (user, issued) = state.auth().login(&identifier, &password).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Json(json!({
        "success": "Login successful.",
        "token": issued.plaintext.expose_secret(),
        "token_type": "Bearer",
        "expires_at": issued
            .token
            .expires_at
            .map(|at| at.format(EXPIRES_AT_FORMAT).to_string()),
    })))
}

/// `POST /api/logout`
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Current token revoked", body = SuccessSchema),
        (status = 401, description = "No valid token", body = ErrorMessageSchema)
    ),
    tags = ["auth"]
)]
pub async fn logout(auth: RequireAuth, State(state): State<AppState>) -> Result<Json<Value>> {
    state.auth().logout(&auth.user, &auth.token).await?;
    clear_sentry_user();
    Ok(Json(json!({ "success": "Successfully logged out." })))
}
