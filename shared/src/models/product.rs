//! Product Model

use serde::{Deserialize, Serialize};

use super::{Category, Tag};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub brand: Option<String>,
    /// Category reference (nullable in storage, required on create)
    pub category_id: Option<i64>,
    pub sku: String,
    /// URL-safe identifier derived from the name
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,

    // -- Relations (populated by application code, skipped by FromRow) --
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Product {
    pub fn tag_ids(&self) -> Vec<i64> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

/// Create product payload
///
/// Required fields are optional here so that missing values surface as
/// validation errors instead of body rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub brand: Option<String>,
    #[serde(alias = "categoryId")]
    pub category_id: Option<i64>,
    /// Generated when absent
    pub sku: Option<String>,
    #[serde(default, alias = "tagIds", alias = "tags")]
    pub tag_ids: Vec<i64>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub brand: Option<String>,
    #[serde(alias = "categoryId")]
    pub category_id: Option<i64>,
    pub sku: Option<String>,
    /// `Some` replaces the whole tag set (empty clears), `None` leaves it untouched
    #[serde(default, alias = "tagIds", alias = "tags")]
    pub tag_ids: Option<Vec<i64>>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.brand.is_none()
            && self.category_id.is_none()
            && self.sku.is_none()
            && self.tag_ids.is_none()
    }
}

/// Result of a find-or-create call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindOrCreateResult {
    pub product: Product,
    pub created: bool,
    /// True when an equivalent product already existed
    pub duplicate_prevented: bool,
}

/// Product resolved by id and slug on the public catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProductView {
    pub product: Product,
    /// The requested slug is stale and the client should follow `canonical_url`
    pub redirect: bool,
    pub canonical_url: String,
}

/// Public listing page after duplicate filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProductPage {
    #[serde(flatten)]
    pub page: crate::response::Page<Product>,
    /// Items dropped from this page as duplicates of another item
    pub duplicates_removed: usize,
}
