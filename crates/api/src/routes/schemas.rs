//! OpenAPI schema types.
//!
//! Handlers take loose JSON objects and the models serialize themselves, so
//! these types only describe the wire shapes for the generated document.
//! Keep them in step with the `Serialize` impls in `crate::models` and
//! `stockroom_core::Page`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use utoipa::ToSchema;

/// Public user representation. The password hash is never included.
#[derive(ToSchema)]
#[schema(as = User)]
pub struct UserSchema {
    #[schema(example = 1)]
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "jane")]
    pub username: String,
    #[schema(example = "jane-at-examplecom")]
    pub slug: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(ToSchema)]
#[schema(as = UserSummary)]
pub struct UserSummarySchema {
    pub id: i32,
    pub username: String,
    pub email: String,
}

#[derive(ToSchema)]
#[schema(as = Product)]
pub struct ProductSchema {
    pub id: i32,
    #[schema(example = "Amber Widget Product")]
    pub name: String,
    pub description: Option<String>,
    /// Two decimal places, `0..=999999.99`.
    #[schema(example = 9.99)]
    pub price: f64,
    /// Units on hand, never negative.
    pub stock: i32,
    /// `/storage/products/<file>`
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(ToSchema)]
#[schema(as = PageLinks)]
pub struct PageLinksSchema {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(ToSchema)]
#[schema(as = PageMeta)]
pub struct PageMetaSchema {
    pub current_page: u32,
    pub from: Option<u64>,
    pub last_page: u32,
    pub path: String,
    #[schema(example = 10)]
    pub per_page: u32,
    pub to: Option<u64>,
    pub total: u64,
}

/// Ten users per page, ordered by id.
#[derive(ToSchema)]
#[schema(as = UserPage)]
pub struct UserPageSchema {
    pub data: Vec<UserSchema>,
    pub links: PageLinksSchema,
    pub meta: PageMetaSchema,
}

/// Ten products per page, newest first.
#[derive(ToSchema)]
#[schema(as = ProductPage)]
pub struct ProductPageSchema {
    pub data: Vec<ProductSchema>,
    pub links: PageLinksSchema,
    pub meta: PageMetaSchema,
}

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub username: String,
    /// At least 8 characters with upper and lower case letters, a digit and
    /// a special character.
    pub password: String,
    pub password_confirmation: String,
}

/// Every field is optional; `is_staff` is reserved for staff.
#[derive(ToSchema)]
pub struct UserUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

/// `email` is accepted in place of `email_or_username`.
#[derive(ToSchema)]
pub struct LoginRequest {
    #[schema(example = "jane")]
    pub email_or_username: String,
    pub password: String,
}

#[derive(ToSchema)]
pub struct LoginResponse {
    #[schema(example = "Login successful.")]
    pub success: String,
    /// Shown once; only its digest is stored.
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// `YYYY-MM-DD HH:MM:SS` in UTC, absent when tokens never expire.
    pub expires_at: Option<String>,
}

#[derive(ToSchema)]
#[schema(as = Success)]
pub struct SuccessSchema {
    pub success: String,
}

#[derive(ToSchema)]
#[schema(as = UserCreated)]
pub struct UserCreatedSchema {
    pub success: String,
    pub user: UserSummarySchema,
}

/// JSON product fields. On update every field is optional.
#[derive(ToSchema)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 9.99)]
    pub price: f64,
    pub stock: i32,
}

/// The same fields as a form, plus an optional image.
#[derive(ToSchema)]
pub struct ProductUpload {
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub stock: String,
    /// jpeg, png, gif, bmp or webp
    #[schema(format = Binary)]
    pub image: Option<String>,
}

/// Every broken rule, keyed by field.
#[derive(ToSchema)]
#[schema(as = ValidationError)]
pub struct ValidationErrorSchema {
    #[schema(example = "The email field is required.")]
    pub message: String,
    pub errors: HashMap<String, Vec<String>>,
}

/// 400, 401 and 403 bodies.
#[derive(ToSchema)]
#[schema(as = ErrorMessage)]
pub struct ErrorMessageSchema {
    #[schema(example = "You are not authenticated")]
    pub errors: String,
}

/// 404 and 5xx bodies.
#[derive(ToSchema)]
#[schema(as = Error)]
pub struct ErrorSchema {
    #[schema(example = "User not found")]
    pub error: String,
}
