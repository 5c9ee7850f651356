//! Product resource.
//!
//! Create and update accept either a JSON object or a `multipart/form-data`
//! form; only the form can carry an `image` file.

use axum::{
    Json,
    extract::{
        FromRequest, Multipart, Path, Query, Request, State, multipart::MultipartError,
    },
    http::{StatusCode, header::CONTENT_TYPE},
};
use serde_json::{Map, Value};

use stockroom_core::{Abilities, Page, ProductId};

use super::schemas::{
    ErrorMessageSchema, ErrorSchema, ProductPageSchema, ProductRequest, ProductSchema,
    ProductUpload, ValidationErrorSchema,
};
use super::users::PageQuery;
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::services::products::{ImageUpload, ProductInput};
use crate::state::AppState;

/// Name of the file part in product forms.
const IMAGE_FIELD: &str = "image";

/// Product fields from a JSON body or a multipart form.
pub struct ProductForm(pub ProductInput);

impl FromRequest<AppState> for ProductForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| {
                ct.trim_start()
                    .to_ascii_lowercase()
                    .starts_with("multipart/form-data")
            });

        if is_multipart {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            return read_form(&mut multipart).await.map(Self);
        }

        let ApiJson(fields) = ApiJson::<Map<String, Value>>::from_request(req, state).await?;
        Ok(Self(ProductInput {
            fields,
            image: None,
        }))
    }
}

async fn read_form(multipart: &mut Multipart) -> Result<ProductInput> {
    let mut input = ProductInput::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == IMAGE_FIELD {
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            // Browsers send an empty, unnamed part for an untouched file input
            if bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                continue;
            }
            input.image = Some(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let text = field.text().await.map_err(multipart_error)?;
            input.fields.insert(name, Value::String(text));
        }
    }
    Ok(input)
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

fn product_id(raw: &str) -> Result<ProductId> {
    raw.parse().map_err(|_| AppError::NotFound("Product"))
}

/// `GET /api/products`
#[utoipa::path(
    get,
    path = "/api/products",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of products, newest first", body = ProductPageSchema),
        (status = 401, description = "No valid token", body = ErrorMessageSchema)
    ),
    tags = ["products"]
)]
pub async fn index(
    auth: RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Product>>> {
    auth.require(Abilities::PRODUCTS_READ)?;
    let request = query.request();
    let (products, total) = state.products().list(request).await?;
    Ok(Json(Page::new(
        products,
        request,
        total,
        &state.config().url("/api/products"),
    )))
}

/// `POST /api/products`
#[utoipa::path(
    post,
    path = "/api/products",
    request_body(content(
        (ProductRequest = "application/json"),
        (ProductUpload = "multipart/form-data")
    )),
    responses(
        (status = 201, description = "Product created", body = ProductSchema),
        (status = 401, description = "No valid token", body = ErrorMessageSchema),
        (status = 422, description = "Invalid input or image", body = ValidationErrorSchema)
    ),
    tags = ["products"]
)]
pub async fn store(
    auth: RequireAuth,
    State(state): State<AppState>,
    ProductForm(input): ProductForm,
) -> Result<(StatusCode, Json<Product>)> {
    auth.require(Abilities::PRODUCTS_WRITE)?;
    let product = state.products().create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /api/products/{id}`
#[utoipa::path(
    get,
    path = "/api/products/{product}",
    params(("product" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = ProductSchema),
        (status = 404, description = "No such product", body = ErrorSchema)
    ),
    tags = ["products"]
)]
pub async fn show(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    auth.require(Abilities::PRODUCTS_READ)?;
    let product = state.products().find(product_id(&id)?).await?;
    Ok(Json(product))
}

/// `PUT|PATCH /api/products/{id}`
#[utoipa::path(
    put,
    path = "/api/products/{product}",
    params(("product" = i32, Path, description = "Product id")),
    request_body(content(
        (ProductRequest = "application/json"),
        (ProductUpload = "multipart/form-data")
    )),
    responses(
        (status = 200, description = "The updated product", body = ProductSchema),
        (status = 404, description = "No such product", body = ErrorSchema),
        (status = 422, description = "Invalid input or image", body = ValidationErrorSchema)
    ),
    tags = ["products"]
)]
pub async fn update(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ProductForm(input): ProductForm,
) -> Result<Json<Product>> {
    auth.require(Abilities::PRODUCTS_WRITE)?;
    let product = state.products().update(product_id(&id)?, &input).await?;
    Ok(Json(product))
}

/// `DELETE /api/products/{id}`
#[utoipa::path(
    delete,
    path = "/api/products/{product}",
    params(("product" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product and image deleted"),
        (status = 404, description = "No such product", body = ErrorSchema)
    ),
    tags = ["products"]
)]
pub async fn destroy(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    auth.require(Abilities::PRODUCTS_WRITE)?;
    state.products().delete(product_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
