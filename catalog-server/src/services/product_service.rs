//! Product Service - orchestrates validation, the uniqueness guard and the stores
//!
//! Every write follows the same pipeline: validate input, run the guard,
//! verify referenced categories and tags, derive slug/SKU, persist. A unique
//! constraint hit at persist time (a concurrent writer won the race) is
//! re-checked through the guard so callers always see the structured conflict.

use std::sync::Arc;

use shared::models::{
    DuplicateReport, DuplicateRule, FindOrCreateResult, Product, ProductCreate, ProductUpdate,
    PublicProductPage, PublicProductView,
};
use shared::response::Page;
use shared::util::{now_millis, snowflake_id};

use crate::catalog::guard::{DuplicateCandidate, GuardConfig, UniquenessGuard};
use crate::catalog::query::{ProductFilters, QueryCriteriaBuilder};
use crate::catalog::slug::generate_sku;
use crate::catalog::store::{CategoryStore, ProductRecord, ProductStore, TagStore};
use crate::catalog::{CatalogError, Resource};
use crate::db::repository::RepoError;

pub type CatalogResult<T> = Result<T, CatalogError>;

pub const MAX_NAME_LENGTH: usize = 200;
pub const DEFAULT_RELATED_LIMIT: u32 = 4;
pub const MAX_RELATED_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    categories: Arc<dyn CategoryStore>,
    tags: Arc<dyn TagStore>,
    guard: UniquenessGuard,
}

impl std::fmt::Debug for ProductService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductService")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

fn validate_name(name: Option<&str>) -> CatalogResult<String> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(CatalogError::validation("name", "Product name is required"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CatalogError::validation(
            "name",
            format!("Product name must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(name.to_string())
}

fn validate_price(price: f64) -> CatalogResult<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::validation(
            "price",
            "Price must be a non-negative number",
        ));
    }
    Ok(price)
}

fn validate_stock(stock: i64) -> CatalogResult<i64> {
    if stock < 0 {
        return Err(CatalogError::validation("stock", "Stock cannot be negative"));
    }
    Ok(stock)
}

/// Blank SKUs count as absent
fn supplied_sku(sku: Option<&str>) -> Option<String> {
    sku.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

impl ProductService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        categories: Arc<dyn CategoryStore>,
        tags: Arc<dyn TagStore>,
        guard_config: GuardConfig,
    ) -> Self {
        let guard = UniquenessGuard::new(products.clone(), guard_config);
        Self {
            products,
            categories,
            tags,
            guard,
        }
    }

    pub fn guard(&self) -> &UniquenessGuard {
        &self.guard
    }

    async fn ensure_category(&self, category_id: i64) -> CatalogResult<()> {
        if self.categories.exists_by_id(category_id).await? {
            Ok(())
        } else {
            Err(CatalogError::not_found(Resource::Category, category_id))
        }
    }

    /// Every id must resolve; the error lists all missing ones
    async fn ensure_tags(&self, tag_ids: &[i64]) -> CatalogResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }
        let found = self.tags.find_by_ids(tag_ids).await?;
        let missing: Vec<i64> = tag_ids
            .iter()
            .filter(|id| !found.iter().any(|t| t.id == **id))
            .copied()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::NotFound {
                resource: Resource::Tag,
                ids: missing,
            })
        }
    }

    /// Map a storage unique violation to a structured conflict.
    ///
    /// The guard is re-run first; when it sees nothing (a race it cannot
    /// observe, or keys written under other guard settings) the row holding
    /// the persisted key, SKU or slug is looked up directly.
    async fn post_flight(
        &self,
        err: RepoError,
        candidate: &DuplicateCandidate,
        name_key: &str,
        exclude_id: Option<i64>,
    ) -> CatalogError {
        let RepoError::Duplicate(detail) = err else {
            return CatalogError::Store(err);
        };
        tracing::warn!(detail = %detail, "Unique constraint hit after guard check");
        match self.guard.check_candidate(candidate, exclude_id).await {
            Ok(conflicts) => {
                if let Some(conflict) = conflicts.into_iter().next() {
                    return CatalogError::Conflict(Box::new(conflict));
                }
            }
            Err(e) => return e.into(),
        }

        let colliding = match self.colliding_row(candidate, name_key, exclude_id).await {
            Ok(hit) => hit,
            Err(e) => return CatalogError::Unavailable(e),
        };
        let Some((rule, existing)) = colliding else {
            return CatalogError::Store(RepoError::Duplicate(
                "Product conflicts with an existing product".into(),
            ));
        };
        match self
            .guard
            .conflict_with(rule, candidate, &existing, exclude_id)
            .await
        {
            Ok(conflict) => CatalogError::Conflict(Box::new(conflict)),
            Err(e) => e.into(),
        }
    }

    /// Row occupying one of the unique keys the record was written with
    async fn colliding_row(
        &self,
        candidate: &DuplicateCandidate,
        name_key: &str,
        exclude_id: Option<i64>,
    ) -> Result<Option<(DuplicateRule, Product)>, RepoError> {
        let other = |p: &Product| Some(p.id) != exclude_id;

        if candidate.category_id.is_some()
            && let Some(p) = self
                .products
                .find_by_name_key(name_key)
                .await?
                .into_iter()
                .find(|p| other(p) && p.category_id == candidate.category_id)
        {
            return Ok(Some((DuplicateRule::NameCategory, p)));
        }
        if let Some(sku) = candidate.sku.as_deref()
            && let Some(p) = self.products.find_by_sku(sku).await?
            && other(&p)
        {
            return Ok(Some((DuplicateRule::Sku, p)));
        }
        if let Some(slug) = candidate.slug.as_deref()
            && let Some(p) = self.products.find_by_slug(slug).await?
            && other(&p)
        {
            return Ok(Some((DuplicateRule::Slug, p)));
        }
        Ok(None)
    }

    pub async fn get(&self, id: i64) -> CatalogResult<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found(Resource::Product, id))
    }

    pub async fn create(&self, input: ProductCreate) -> CatalogResult<Product> {
        let name = validate_name(input.name.as_deref())?;
        let price = validate_price(
            input
                .price
                .ok_or_else(|| CatalogError::validation("price", "Price is required"))?,
        )?;
        let category_id = input
            .category_id
            .ok_or_else(|| CatalogError::validation("category_id", "Category is required"))?;
        let stock = validate_stock(input.stock.unwrap_or(0))?;
        let sku = supplied_sku(input.sku.as_deref());

        let candidate = DuplicateCandidate::named(name.clone(), Some(category_id)).with_sku(sku.clone());
        self.guard.validate(&candidate, None).await?;

        self.ensure_category(category_id).await?;
        let tag_ids = dedup_ids(&input.tag_ids);
        self.ensure_tags(&tag_ids).await?;

        let slug = self.guard.generate_unique_slug(&name, None).await?;
        let sku = sku.unwrap_or_else(generate_sku);
        let now = now_millis();
        let record = ProductRecord {
            id: snowflake_id(),
            name_key: self.guard.config().name_key(&name),
            name,
            description: input.description,
            price,
            stock,
            brand: input.brand,
            category_id: Some(category_id),
            sku,
            slug,
            created_at: now,
            updated_at: now,
        };
        let candidate = candidate
            .with_sku(Some(record.sku.clone()))
            .with_slug(Some(record.slug.clone()));
        let key = record.name_key.clone();

        match self.products.create(record, &tag_ids).await {
            Ok(product) => {
                tracing::info!(product_id = product.id, name = %product.name, sku = %product.sku, "Product created");
                Ok(product)
            }
            Err(e) => Err(self.post_flight(e, &candidate, &key, None).await),
        }
    }

    pub async fn update(&self, id: i64, input: ProductUpdate) -> CatalogResult<Product> {
        let existing = self.get(id).await?;
        if input.is_empty() {
            return Ok(existing);
        }

        let name = match input.name.as_deref() {
            Some(n) => validate_name(Some(n))?,
            None => existing.name.clone(),
        };
        let price = match input.price {
            Some(p) => validate_price(p)?,
            None => existing.price,
        };
        let stock = match input.stock {
            Some(s) => validate_stock(s)?,
            None => existing.stock,
        };
        let new_sku = match input.sku.as_deref() {
            Some(s) => Some(
                supplied_sku(Some(s))
                    .ok_or_else(|| CatalogError::validation("sku", "SKU cannot be empty"))?,
            ),
            None => None,
        };

        let category_id = input.category_id.or(existing.category_id);
        let category_changed = input.category_id.is_some() && category_id != existing.category_id;
        if category_changed && let Some(cid) = category_id {
            self.ensure_category(cid).await?;
        }
        let tag_ids = input.tag_ids.as_deref().map(dedup_ids);
        if let Some(ids) = &tag_ids {
            self.ensure_tags(ids).await?;
        }

        let name_changed = name != existing.name;
        let sku_changed = new_sku.as_deref().is_some_and(|s| s != existing.sku);
        let candidate = DuplicateCandidate::named(name.clone(), category_id)
            .with_sku(new_sku.clone().filter(|_| sku_changed));
        if name_changed || category_changed || sku_changed {
            self.guard.validate(&candidate, Some(id)).await?;
        }

        let only_tags = input.name.is_none()
            && input.description.is_none()
            && input.price.is_none()
            && input.stock.is_none()
            && input.brand.is_none()
            && input.category_id.is_none()
            && input.sku.is_none();
        if only_tags && let Some(ids) = &tag_ids {
            self.products.set_tags(id, ids).await?;
            tracing::info!(product_id = id, tags = ids.len(), "Product tags replaced");
            return self.get(id).await;
        }

        let slug = if name_changed {
            self.guard.generate_unique_slug(&name, Some(id)).await?
        } else {
            existing.slug.clone()
        };
        let record = ProductRecord {
            id,
            name_key: self.guard.config().name_key(&name),
            name,
            description: input.description.or(existing.description),
            price,
            stock,
            brand: input.brand.or(existing.brand),
            category_id,
            sku: new_sku.unwrap_or(existing.sku),
            slug,
            created_at: existing.created_at,
            updated_at: now_millis(),
        };
        let candidate = candidate
            .with_sku(Some(record.sku.clone()))
            .with_slug(Some(record.slug.clone()));
        let key = record.name_key.clone();

        match self.products.update(record, tag_ids.as_deref()).await {
            Ok(product) => {
                tracing::info!(product_id = id, "Product updated");
                Ok(product)
            }
            Err(RepoError::NotFound(_)) => Err(CatalogError::not_found(Resource::Product, id)),
            Err(e) => Err(self.post_flight(e, &candidate, &key, Some(id)).await),
        }
    }

    pub async fn delete(&self, id: i64) -> CatalogResult<()> {
        if !self.products.delete(id).await? {
            return Err(CatalogError::not_found(Resource::Product, id));
        }
        tracing::info!(product_id = id, "Product deleted");
        Ok(())
    }

    pub async fn list(&self, filters: &ProductFilters) -> CatalogResult<Page<Product>> {
        let criteria = QueryCriteriaBuilder::from_filters(filters)
            .with_category_details()
            .with_tags()
            .build();
        let (items, total) = self.products.query(&criteria).await?;
        Ok(Page::new(items, total, criteria.page, criteria.page_size))
    }

    pub async fn detect_all_duplicates(&self) -> CatalogResult<DuplicateReport> {
        let report = self.guard.detect_all_duplicates().await?;
        if report.duplicate_groups > 0 {
            tracing::warn!(
                groups = report.duplicate_groups,
                redundant = report.summary.redundant_products,
                "Duplicate products detected"
            );
        }
        Ok(report)
    }

    /// Return the product with the same normalized name in the category, or
    /// create it
    pub async fn find_or_create(&self, input: ProductCreate) -> CatalogResult<FindOrCreateResult> {
        let name = validate_name(input.name.as_deref())?;
        let category_id = input
            .category_id
            .ok_or_else(|| CatalogError::validation("category_id", "Category is required"))?;

        if let Some(existing) = self.find_equivalent(&name, category_id).await? {
            tracing::info!(product_id = existing.id, "Find-or-create matched existing product");
            return Ok(FindOrCreateResult {
                product: existing,
                created: false,
                duplicate_prevented: true,
            });
        }

        match self.create(input).await {
            Ok(product) => Ok(FindOrCreateResult {
                product,
                created: true,
                duplicate_prevented: false,
            }),
            // Lost a race against an identical create
            Err(CatalogError::Conflict(conflict))
                if conflict.rule == DuplicateRule::NameCategory =>
            {
                Ok(FindOrCreateResult {
                    product: self.get(conflict.existing_id).await?,
                    created: false,
                    duplicate_prevented: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn find_equivalent(&self, name: &str, category_id: i64) -> CatalogResult<Option<Product>> {
        let config = self.guard.config();
        let wanted = config.normalize(name);
        let hit = self
            .products
            .find_by_name_key(&config.name_key(name))
            .await?
            .into_iter()
            .find(|p| p.category_id == Some(category_id) && config.normalize(&p.name) == wanted);
        match hit {
            Some(p) => Ok(Some(self.get(p.id).await?)),
            None => Ok(None),
        }
    }

    /// Public listing; optionally drops duplicates from the returned page
    pub async fn public_search(
        &self,
        filters: &ProductFilters,
        exclude_duplicates: bool,
    ) -> CatalogResult<PublicProductPage> {
        let mut page = self.list(filters).await?;
        let mut duplicates_removed = 0;
        if exclude_duplicates {
            let filtered = self.guard.filter_duplicates(std::mem::take(&mut page.items));
            if filtered.duplicates_found {
                tracing::debug!(removed = filtered.removed, "Duplicates removed from public listing");
            }
            duplicates_removed = filtered.removed;
            page.items = filtered.items;
        }
        Ok(PublicProductPage {
            page,
            duplicates_removed,
        })
    }

    /// Resolve a product by id; a stale slug yields a redirect to the canonical URL
    pub async fn find_public(&self, id: i64, slug: &str) -> CatalogResult<PublicProductView> {
        let product = self.get(id).await?;
        let redirect = product.slug != slug;
        let canonical_url = format!("/api/public/products/{id}/{}", product.slug);
        Ok(PublicProductView {
            product,
            redirect,
            canonical_url,
        })
    }

    pub async fn related(&self, id: i64, limit: Option<u32>) -> CatalogResult<Vec<Product>> {
        let product = self.get(id).await?;
        let limit = limit
            .unwrap_or(DEFAULT_RELATED_LIMIT)
            .clamp(1, MAX_RELATED_LIMIT);
        let items = self.products.related(&product, limit).await?;
        Ok(self.guard.filter_duplicates(items).items)
    }
}
