//! Product catalog with image uploads.
//!
//! Images are written under `products/` in file storage before the row is
//! saved. If the row cannot be saved the new file is removed again; files a
//! row no longer references are removed after the row is saved.

use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use stockroom_core::{PageRequest, ProductId};

use crate::db::{ProductStore, Repositories, RepositoryError};
use crate::models::{NewProduct, Product, ProductChanges};
use crate::storage::{FileStorage, StorageError};
use crate::validation::{Field, ValidationErrors, Validator};

const NAME_MAX: usize = 255;

/// Directory (storage key prefix) for product images.
pub const IMAGE_DIR: &str = "products";

/// Accepted image types and the extension each is stored with.
pub const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/bmp", "bmp"),
    ("image/webp", "webp"),
];

/// Errors from product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error("validation failed: {}", .0.summary())]
    Validation(ValidationErrors),

    #[error("product not found")]
    NotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<ValidationErrors> for ProductError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// An uploaded file as received.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Text fields plus an optional image, from a JSON body or a multipart form.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub fields: Map<String, Value>,
    pub image: Option<ImageUpload>,
}

/// A validated image ready to store.
struct ValidImage<'a> {
    extension: &'static str,
    bytes: &'a [u8],
}

/// Product service.
pub struct ProductService<'a> {
    products: &'a dyn ProductStore,
    storage: &'a dyn FileStorage,
    max_upload_bytes: usize,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub fn new(
        repos: &'a Repositories,
        storage: &'a dyn FileStorage,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            products: repos.products.as_ref(),
            storage,
            max_upload_bytes,
        }
    }

    /// One page of products, newest first, and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(&self, page: PageRequest) -> Result<(Vec<Product>, u64), RepositoryError> {
        let products = self.products.list(page).await?;
        let total = self.products.count().await?;
        Ok((products, total))
    }

    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if there is no such product.
    pub async fn find(&self, id: ProductId) -> Result<Product, ProductError> {
        self.products.find(id).await?.ok_or(ProductError::NotFound)
    }

    /// Create a product, storing its image if one was uploaded.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Validation` listing every broken rule, or a
    /// storage or database error.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, ProductError> {
        let mut v = Validator::new(&input.fields);
        let name = v.string("name", true, NAME_MAX);
        let description = v.string("description", false, usize::MAX).into_option();
        let price = v.price("price", true);
        let stock = v.integer("stock", true, 0);
        let image = self.validate_image(&mut v, input.image.as_ref());
        v.finish()?;

        let (Field::Set(name), Field::Set(price), Field::Set(stock)) = (name, price, stock) else {
            return Err(ValidationErrors::single("name", "The given data was invalid.").into());
        };

        let stored = match image {
            Some(image) => Some(self.store_image(&image).await?),
            None => None,
        };

        let result = self
            .products
            .create(NewProduct {
                name,
                description,
                price,
                stock,
                image: stored.as_ref().map(|key| self.storage.url(key)),
            })
            .await;

        match result {
            Ok(product) => {
                tracing::info!(product_id = %product.id, "Product created");
                Ok(product)
            }
            Err(e) => {
                if let Some(key) = stored {
                    self.remove_file(&key).await;
                }
                Err(e.into())
            }
        }
    }

    /// Change the fields present in `input`.
    ///
    /// A new image replaces the old one. Without one, a truthy
    /// `clear_image` removes the image. Otherwise the image is kept.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound`, `ProductError::Validation`, or a
    /// storage or database error.
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, ProductError> {
        let mut product = self.find(id).await?;

        let mut v = Validator::new(&input.fields);
        let sent = |field: &str| input.fields.contains_key(field);
        let name = v.string("name", sent("name"), NAME_MAX).into_option();
        let description = v.string("description", false, usize::MAX).into_patch();
        let price = v.price("price", sent("price")).into_option();
        let stock = v.integer("stock", sent("stock"), 0).into_option();
        let image = self.validate_image(&mut v, input.image.as_ref());
        let clear_image = v.truthy("clear_image");
        v.finish()?;

        let stored = match image {
            Some(image) => Some(self.store_image(&image).await?),
            None => None,
        };
        let image = match &stored {
            Some(key) => Some(Some(self.storage.url(key))),
            None if clear_image => Some(None),
            None => None,
        };

        let displaced = product.apply(ProductChanges {
            name,
            description,
            price,
            stock,
            image,
        });

        let saved = match self.products.update(&product).await {
            Ok(saved) => saved,
            Err(e) => {
                if let Some(key) = stored {
                    self.remove_file(&key).await;
                }
                return Err(match e {
                    RepositoryError::NotFound => ProductError::NotFound,
                    other => other.into(),
                });
            }
        };

        if let Some(url) = displaced {
            self.remove_image(&url).await;
        }

        tracing::info!(product_id = %saved.id, "Product updated");
        Ok(saved)
    }

    /// Delete a product and its image.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if there is no such product.
    pub async fn delete(&self, id: ProductId) -> Result<(), ProductError> {
        let product = self.find(id).await?;
        if !self.products.delete(id).await? {
            return Err(ProductError::NotFound);
        }
        if let Some(url) = &product.image {
            self.remove_image(url).await;
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    fn validate_image<'i>(
        &self,
        v: &mut Validator<'_>,
        upload: Option<&'i ImageUpload>,
    ) -> Option<ValidImage<'i>> {
        let upload = upload?;
        if upload.bytes.is_empty() {
            v.add("image", "The image field must be a file.");
            return None;
        }

        let content_type = upload
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase());
        let extension = content_type.as_deref().and_then(|ct| {
            IMAGE_TYPES
                .iter()
                .find(|(mime, _)| *mime == ct)
                .map(|(_, ext)| *ext)
        });
        let Some(extension) = extension else {
            v.add(
                "image",
                "The image field must be a file of type: jpeg, png, gif, bmp, webp.",
            );
            return None;
        };

        if upload.bytes.len() > self.max_upload_bytes {
            v.add(
                "image",
                format!(
                    "The image field must not be greater than {} kilobytes.",
                    self.max_upload_bytes / 1024
                ),
            );
            return None;
        }

        Some(ValidImage {
            extension,
            bytes: &upload.bytes,
        })
    }

    async fn store_image(&self, image: &ValidImage<'_>) -> Result<String, StorageError> {
        let key = format!("{IMAGE_DIR}/{}.{}", Uuid::new_v4(), image.extension);
        self.storage.put(&key, image.bytes).await?;
        Ok(key)
    }

    /// Remove the file behind a public URL, logging rather than failing.
    async fn remove_image(&self, url: &str) {
        match self.storage.path_from_url(url) {
            Some(key) => self.remove_file(&key).await,
            None => tracing::warn!(url, "Image URL does not point into storage"),
        }
    }

    async fn remove_file(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(key, error = %e, "Failed to delete image");
        }
    }
}
