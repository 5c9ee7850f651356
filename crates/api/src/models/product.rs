//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockroom_core::{Price, ProductId};

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    /// Units on hand, never negative.
    pub stock: i32,
    /// Public URL of the stored image (`/storage/products/<file>`).
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Apply a partial update, returning the image URL it displaced, if any.
    pub fn apply(&mut self, changes: ProductChanges) -> Option<String> {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(stock) = changes.stock {
            self.stock = stock;
        }
        match changes.image {
            Some(image) if image != self.image => std::mem::replace(&mut self.image, image),
            _ => None,
        }
    }
}

/// A product about to be inserted.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: i32,
    pub image: Option<String>,
}

/// Fields to change on an existing product. `None` leaves a field alone;
/// `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Price>,
    pub stock: Option<i32>,
    pub image: Option<Option<String>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(1),
            name: "Widget".to_string(),
            description: Some("A widget".to_string()),
            price: Price::parse("9.99").unwrap(),
            stock: 3,
            image: Some("/storage/products/a.png".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_untouched_image_is_kept() {
        let mut product = product();
        let displaced = product.apply(ProductChanges {
            name: Some("Gadget".to_string()),
            price: Some(Price::parse("12").unwrap()),
            stock: Some(0),
            ..ProductChanges::default()
        });
        assert_eq!(displaced, None);
        assert_eq!(product.name, "Gadget");
        assert_eq!(product.stock, 0);
        assert_eq!(product.image.as_deref(), Some("/storage/products/a.png"));
        assert_eq!(product.description.as_deref(), Some("A widget"));
    }

    #[test]
    fn test_replacing_image_returns_the_old_one() {
        let mut product = product();
        let displaced = product.apply(ProductChanges {
            image: Some(Some("/storage/products/b.png".to_string())),
            ..ProductChanges::default()
        });
        assert_eq!(displaced.as_deref(), Some("/storage/products/a.png"));
        assert_eq!(product.image.as_deref(), Some("/storage/products/b.png"));
    }

    #[test]
    fn test_clearing_image_and_description() {
        let mut product = product();
        let displaced = product.apply(ProductChanges {
            description: Some(None),
            image: Some(None),
            ..ProductChanges::default()
        });
        assert_eq!(displaced.as_deref(), Some("/storage/products/a.png"));
        assert_eq!(product.image, None);
        assert_eq!(product.description, None);
    }

    #[test]
    fn test_serializes_price_as_number() {
        let json = serde_json::to_value(product()).unwrap();
        assert_eq!(json["price"], serde_json::json!(9.99));
        assert_eq!(json["stock"], 3);
    }
}
