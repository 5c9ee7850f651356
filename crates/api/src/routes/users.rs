//! User resource.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use utoipa::IntoParams;

use stockroom_core::{Abilities, Page, PageRequest};

use super::auth::REGISTERED;
use super::schemas::{
    ErrorMessageSchema, ErrorSchema, RegisterRequest, UserCreatedSchema, UserPageSchema,
    UserSchema, UserUpdateRequest, ValidationErrorSchema,
};
use crate::error::{ApiJson, Result};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::users::UserKey;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number; anything unparsable means page 1.
    #[param(value_type = Option<u32>)]
    page: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), PageRequest::DEFAULT_PER_PAGE)
    }
}

/// `GET /api/user`
#[utoipa::path(
    get,
    path = "/api/user",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of users", body = UserPageSchema),
        (status = 401, description = "No valid token", body = ErrorMessageSchema),
        (status = 403, description = "Token lacks users:read", body = ErrorMessageSchema)
    ),
    tags = ["users"]
)]
pub async fn index(
    auth: RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<User>>> {
    auth.require(Abilities::USERS_READ)?;
    let request = query.request();
    let (users, total) = state.users().list(request).await?;
    Ok(Json(Page::new(
        users,
        request,
        total,
        &state.config().url("/api/user"),
    )))
}

/// `POST /api/user`
#[utoipa::path(
    post,
    path = "/api/user",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserCreatedSchema),
        (status = 422, description = "Invalid input", body = ValidationErrorSchema)
    ),
    tags = ["users"],
    security(())
)]
pub async fn store(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<Map<String, Value>>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = state.users().register(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": REGISTERED, "user": user.summary() })),
    ))
}

/// `GET /api/user/{id|username|slug}`
#[utoipa::path(
    get,
    path = "/api/user/{user}",
    params(("user" = String, Path, description = "Id, username or slug")),
    responses(
        (status = 200, description = "The user", body = UserSchema),
        (status = 401, description = "No valid token", body = ErrorMessageSchema),
        (status = 404, description = "No such user", body = ErrorSchema)
    ),
    tags = ["users"]
)]
pub async fn show(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<User>> {
    auth.require(Abilities::USERS_READ)?;
    let user = state
        .users()
        .resolve(&key, UserKey::IdUsernameOrSlug)
        .await?;
    Ok(Json(user))
}

/// `PUT|PATCH /api/user/{id|slug}`
#[utoipa::path(
    put,
    path = "/api/user/{user}",
    params(("user" = String, Path, description = "Id or slug")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "The updated user", body = UserSchema),
        (status = 403, description = "Not yourself, and not staff", body = ErrorMessageSchema),
        (status = 404, description = "No such user", body = ErrorSchema),
        (status = 422, description = "Invalid input", body = ValidationErrorSchema)
    ),
    tags = ["users"]
)]
pub async fn update(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(key): Path<String>,
    ApiJson(input): ApiJson<Map<String, Value>>,
) -> Result<Json<User>> {
    auth.require(Abilities::USERS_WRITE)?;
    let user = state.users().update(&auth.user, &key, &input).await?;
    Ok(Json(user))
}

/// `DELETE /api/user/{id|slug}`
#[utoipa::path(
    delete,
    path = "/api/user/{user}",
    params(("user" = String, Path, description = "Id or slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not yourself, and not staff", body = ErrorMessageSchema),
        (status = 404, description = "No such user", body = ErrorSchema)
    ),
    tags = ["users"]
)]
pub async fn destroy(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    auth.require(Abilities::USERS_WRITE)?;
    state.users().delete(&auth.user, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}
