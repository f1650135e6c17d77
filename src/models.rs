// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Opaque identifier of an image held by the blob store (a Cloudinary public id).
/// It is never a URL the browser can load directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub price: i64,
    #[sqlx(rename = "display_order")]
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub image_ref: Option<ImageRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[sqlx(rename = "display_order")]
    pub order: i64,
}

/// How a view orders its collection before paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Ascending by the curated `order` field.
    #[strum(serialize = "curated")]
    Curated,
    /// Most recently created first.
    #[strum(serialize = "newest")]
    Newest,
}

/// Which slice of the catalog a view is backed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogScope {
    All,
    Featured,
    Category(String),
    Wishlist(Uuid),
}

/// Product as exposed to the storefront: the storage ref is replaced by a resolved URL.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPublic {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub image_url: Option<String>,
}

impl ProductPublic {
    pub fn from_product(product: &Product, image_url: Option<String>) -> Self {
        ProductPublic {
            id: product.id,
            name: product.name.clone(),
            category_id: product.category_id,
            price: product.price,
            created_at: product.created_at,
            image_url,
        }
    }
}
