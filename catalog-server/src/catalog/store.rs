//! Data-store capabilities consumed by the guard and the product service
//!
//! The SQLite implementation lives in [`crate::db::SqliteCatalog`].

use async_trait::async_trait;
use shared::models::{Category, Product, Tag};

use super::query::QueryCriteria;
use crate::db::repository::RepoResult;

/// Fully resolved product row, written as a whole on create and update
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    /// Normalized name persisted for the (name, category) unique index
    pub name_key: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub brand: Option<String>,
    pub category_id: Option<i64>,
    pub sku: String,
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Product persistence. Returned products have `category` and `tags` populated
/// unless noted otherwise.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Every product, without relations
    async fn find_all(&self) -> RepoResult<Vec<Product>>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Product>>;

    /// Case-insensitive slug lookup
    async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Product>>;

    /// Case-insensitive SKU lookup
    async fn find_by_sku(&self, sku: &str) -> RepoResult<Option<Product>>;

    /// Products whose stored name key equals `name_key`, without relations
    async fn find_by_name_key(&self, name_key: &str) -> RepoResult<Vec<Product>>;

    async fn exists_by_id(&self, id: i64) -> RepoResult<bool>;

    /// Insert the product and its tag associations atomically
    async fn create(&self, record: ProductRecord, tag_ids: &[i64]) -> RepoResult<Product>;

    /// Overwrite the product row; `Some(tags)` replaces the association set
    /// in the same transaction
    async fn update(
        &self,
        record: ProductRecord,
        tag_ids: Option<&[i64]>,
    ) -> RepoResult<Product>;

    /// Returns false when no product had this id
    async fn delete(&self, id: i64) -> RepoResult<bool>;

    /// Replace the full association set of a product
    async fn set_tags(&self, id: i64, tag_ids: &[i64]) -> RepoResult<()>;

    /// One page of matching products plus the total match count
    async fn query(&self, criteria: &QueryCriteria) -> RepoResult<(Vec<Product>, u64)>;

    /// Products sharing the category or any tag with `product`, newest first
    async fn related(&self, product: &Product, limit: u32) -> RepoResult<Vec<Product>>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn exists_by_id(&self, id: i64) -> RepoResult<bool>;
    async fn find_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Category>>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    async fn exists_by_id(&self, id: i64) -> RepoResult<bool>;
    async fn find_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Tag>>;
}
