use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::image::ImageKind;

/// Directory inside the public storage area holding product images.
pub const IMAGE_DIR: &str = "products";

/// Product entity - matches SQL schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    /// Unique across all products
    pub name: String,
    pub category: String,
    pub price: f64,
    /// Between 0 and 5 when set
    pub rating: Option<f64>,
    /// Storage-relative path, e.g. `products/0192....jpg`
    pub image: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a new record from validated input. The uploaded image (if any)
    /// must already be stored; `image` is its storage path.
    pub fn new(input: NewProduct, image: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            category: input.category,
            price: input.price,
            rating: input.rating,
            image,
            description: input.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the scalar fields of `changes`. The image is handled separately.
    pub fn apply(&mut self, changes: &ProductChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(category) = &changes.category {
            self.category = category.clone();
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(rating) = changes.rating {
            self.rating = rating;
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Product as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    #[schema(example = "Desk Lamp")]
    pub name: String,
    #[schema(example = "Home")]
    pub category: String,
    #[schema(example = 49.99)]
    pub price: f64,
    #[schema(example = 4.5)]
    pub rating: Option<f64>,
    /// Path inside the public storage area
    #[schema(example = "products/0192f0c4-8a6e-7c1d-b2a3-5f7e9d0c1b2a.jpg")]
    pub image: Option<String>,
    /// Public URL of the image
    #[schema(example = "/storage/products/0192f0c4-8a6e-7c1d-b2a3-5f7e9d0c1b2a.jpg")]
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn new(product: Product, image_url: Option<String>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            category: product.category,
            price: product.price,
            rating: product.rating,
            image: product.image,
            image_url,
            description: product.description,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// An upload that passed the image rules
#[derive(Debug, Clone, PartialEq)]
pub struct ValidImage {
    pub kind: ImageKind,
    pub bytes: Bytes,
}

/// Validated input for creating a product
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub image: Option<ValidImage>,
}

/// Validated partial update. `None` leaves a field unchanged; for nullable
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<Option<f64>>,
    pub description: Option<Option<String>>,
    pub image: Option<ValidImage>,
}

/// Columns a listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SortField {
    Price,
    Rating,
    CreatedAt,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// JSON body for creating or updating a product. Documentation only: the
/// handlers read the body through [`ProductInput`](crate::input::ProductInput).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductPayload {
    #[schema(example = "Desk Lamp", max_length = 255)]
    pub name: String,
    #[schema(example = "Home", max_length = 255)]
    pub category: String,
    #[schema(example = 49.99, minimum = 0)]
    pub price: f64,
    #[schema(example = 4.5, minimum = 0, maximum = 5)]
    pub rating: Option<f64>,
    pub description: Option<String>,
}

/// Multipart form for creating or updating a product with an image
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductForm {
    #[schema(example = "Desk Lamp")]
    pub name: String,
    #[schema(example = "Home")]
    pub category: String,
    #[schema(example = "49.99")]
    pub price: String,
    pub rating: Option<String>,
    pub description: Option<String>,
    /// JPEG, PNG or GIF, at most 2048 KB
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
