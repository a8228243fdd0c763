//! In-memory store double for guard and service tests
//!
//! Mirrors the SQLite constraints (unique slug, sku and name key per
//! category) so conflict paths behave like the real store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::models::{Category, Product, Tag};

use super::name_key;
use super::query::{Condition, Field, Op, Predicate, QueryCriteria, Relation, SortField, SortOrder, Value};
use super::slug::slugify;
use super::store::{CategoryStore, ProductRecord, ProductStore, TagStore};
use crate::db::repository::{RepoError, RepoResult};

/// Product fixture with derived slug and SKU
pub fn product(id: i64, name: &str, category_id: Option<i64>) -> Product {
    Product {
        id,
        name: name.to_string(),
        description: None,
        price: 10.0,
        stock: 1,
        brand: None,
        category_id,
        sku: format!("SKU-{id}"),
        slug: slugify(name),
        created_at: id * 10,
        updated_at: id * 10,
        category: None,
        tags: Vec::new(),
    }
}

#[derive(Default)]
struct State {
    products: BTreeMap<i64, Product>,
    product_tags: HashMap<i64, Vec<i64>>,
    /// Persisted name key per product, as the write supplied it
    name_keys: HashMap<i64, String>,
    categories: BTreeMap<i64, Category>,
    tags: BTreeMap<i64, Tag>,
    fail_lookups: bool,
    /// Inserted just before the next write, simulating a concurrent request
    racing_insert: Option<Product>,
}

#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        let mut state = self.state.lock();
        state.name_keys.insert(product.id, name_key(&product.name));
        state.products.insert(product.id, product);
    }

    pub fn add_category(&self, id: i64, name: &str) {
        self.state.lock().categories.insert(
            id,
            Category {
                id,
                name: name.to_string(),
                description: None,
                created_at: 0,
                updated_at: 0,
            },
        );
    }

    pub fn add_tag(&self, id: i64, name: &str) {
        self.state.lock().tags.insert(
            id,
            Tag {
                id,
                name: name.to_string(),
                created_at: 0,
                updated_at: 0,
            },
        );
    }

    pub fn attach_tags(&self, product_id: i64, tag_ids: &[i64]) {
        self.state
            .lock()
            .product_tags
            .insert(product_id, tag_ids.to_vec());
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.state.lock().fail_lookups = fail;
    }

    pub fn race_with(&self, product: Product) {
        self.state.lock().racing_insert = Some(product);
    }

    pub fn len(&self) -> usize {
        self.state.lock().products.len()
    }

    pub fn tag_ids_of(&self, product_id: i64) -> Vec<i64> {
        self.state
            .lock()
            .product_tags
            .get(&product_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl State {
    fn check(&self) -> RepoResult<()> {
        if self.fail_lookups {
            Err(RepoError::Database("store offline".into()))
        } else {
            Ok(())
        }
    }

    fn populate(&self, mut product: Product) -> Product {
        product.category = product
            .category_id
            .and_then(|id| self.categories.get(&id).cloned());
        product.tags = self
            .product_tags
            .get(&product.id)
            .map(|ids| ids.iter().filter_map(|t| self.tags.get(t).cloned()).collect())
            .unwrap_or_default();
        product
    }

    fn apply_race(&mut self) {
        if let Some(p) = self.racing_insert.take() {
            self.name_keys.insert(p.id, name_key(&p.name));
            self.products.insert(p.id, p);
        }
    }

    fn key_of(&self, product: &Product) -> String {
        self.name_keys
            .get(&product.id)
            .cloned()
            .unwrap_or_else(|| name_key(&product.name))
    }

    fn violates_unique(&self, record: &ProductRecord) -> Option<&'static str> {
        self.products
            .values()
            .filter(|p| p.id != record.id)
            .find_map(|p| {
                if p.slug == record.slug {
                    Some("UNIQUE constraint failed: product.slug")
                } else if p.sku == record.sku {
                    Some("UNIQUE constraint failed: product.sku")
                } else if record.category_id.is_some()
                    && p.category_id == record.category_id
                    && self.key_of(p) == record.name_key
                {
                    Some("UNIQUE constraint failed: product.name_key, product.category_id")
                } else {
                    None
                }
            })
    }

    fn write(&mut self, record: ProductRecord, tag_ids: Option<&[i64]>) -> RepoResult<Product> {
        self.check()?;
        self.apply_race();
        if let Some(msg) = self.violates_unique(&record) {
            return Err(RepoError::Duplicate(msg.into()));
        }
        let product = Product {
            id: record.id,
            name: record.name,
            description: record.description,
            price: record.price,
            stock: record.stock,
            brand: record.brand,
            category_id: record.category_id,
            sku: record.sku,
            slug: record.slug,
            created_at: record.created_at,
            updated_at: record.updated_at,
            category: None,
            tags: Vec::new(),
        };
        self.name_keys.insert(product.id, record.name_key);
        self.products.insert(product.id, product.clone());
        if let Some(ids) = tag_ids {
            self.product_tags.insert(product.id, ids.to_vec());
        }
        Ok(self.populate(product))
    }
}

fn matches(state: &State, product: &Product, pred: &Predicate) -> bool {
    let tag_ids = || state.product_tags.get(&product.id).cloned().unwrap_or_default();
    match (pred.field, pred.op, &pred.value) {
        (Field::TagId, Op::In, Value::IntegerList(ids)) => tag_ids().iter().any(|t| ids.contains(t)),
        (Field::CategoryId, Op::Eq, Value::Integer(v)) => product.category_id == Some(*v),
        (Field::Id, Op::Eq, Value::Integer(v)) => product.id == *v,
        (Field::Price, Op::Gte, Value::Float(v)) => product.price >= *v,
        (Field::Price, Op::Lte, Value::Float(v)) => product.price <= *v,
        (Field::Stock, Op::Gte, Value::Integer(v)) => product.stock >= *v,
        (Field::Stock, Op::Lte, Value::Integer(v)) => product.stock <= *v,
        (field, Op::Contains, Value::Text(needle)) => {
            let haystack = match field {
                Field::Name => product.name.as_str(),
                Field::Description => product.description.as_deref().unwrap_or(""),
                Field::Sku => product.sku.as_str(),
                _ => return false,
            };
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }
        _ => false,
    }
}

#[async_trait]
impl ProductStore for MemoryCatalog {
    async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let state = self.state.lock();
        state.check()?;
        Ok(state.products.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Product>> {
        let state = self.state.lock();
        state.check()?;
        Ok(state.products.get(&id).cloned().map(|p| state.populate(p)))
    }

    async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Product>> {
        let state = self.state.lock();
        state.check()?;
        Ok(state
            .products
            .values()
            .find(|p| p.slug.eq_ignore_ascii_case(slug))
            .cloned())
    }

    async fn find_by_sku(&self, sku: &str) -> RepoResult<Option<Product>> {
        let state = self.state.lock();
        state.check()?;
        Ok(state
            .products
            .values()
            .find(|p| p.sku.eq_ignore_ascii_case(sku))
            .cloned())
    }

    async fn find_by_name_key(&self, key: &str) -> RepoResult<Vec<Product>> {
        let state = self.state.lock();
        state.check()?;
        Ok(state
            .products
            .values()
            .filter(|p| state.key_of(p) == key)
            .cloned()
            .collect())
    }

    async fn exists_by_id(&self, id: i64) -> RepoResult<bool> {
        let state = self.state.lock();
        state.check()?;
        Ok(state.products.contains_key(&id))
    }

    async fn create(&self, record: ProductRecord, tag_ids: &[i64]) -> RepoResult<Product> {
        self.state.lock().write(record, Some(tag_ids))
    }

    async fn update(&self, record: ProductRecord, tag_ids: Option<&[i64]>) -> RepoResult<Product> {
        let mut state = self.state.lock();
        if !state.products.contains_key(&record.id) {
            return Err(RepoError::NotFound(format!("Product {} not found", record.id)));
        }
        state.write(record, tag_ids)
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let mut state = self.state.lock();
        state.check()?;
        state.product_tags.remove(&id);
        state.name_keys.remove(&id);
        Ok(state.products.remove(&id).is_some())
    }

    async fn set_tags(&self, id: i64, tag_ids: &[i64]) -> RepoResult<()> {
        let mut state = self.state.lock();
        state.check()?;
        if !state.products.contains_key(&id) {
            return Err(RepoError::NotFound(format!("Product {id} not found")));
        }
        state.product_tags.insert(id, tag_ids.to_vec());
        Ok(())
    }

    async fn query(&self, criteria: &QueryCriteria) -> RepoResult<(Vec<Product>, u64)> {
        let state = self.state.lock();
        state.check()?;
        let mut hits: Vec<Product> = state
            .products
            .values()
            .filter(|p| {
                criteria.conditions.iter().all(|c| match c {
                    Condition::Predicate(pred) => matches(&state, p, pred),
                    Condition::AnyOf(preds) => preds.iter().any(|pred| matches(&state, p, pred)),
                })
            })
            .cloned()
            .collect();

        hits.sort_by(|a, b| {
            let ord = match criteria.sort_by {
                SortField::Id => a.id.cmp(&b.id),
                SortField::Name => a.name.cmp(&b.name),
                SortField::Price => a.price.total_cmp(&b.price),
                SortField::Stock => a.stock.cmp(&b.stock),
                SortField::Sku => a.sku.cmp(&b.sku),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            match criteria.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = hits.len() as u64;
        let enrich = criteria.includes(Relation::Category) || criteria.includes(Relation::Tags);
        let page = hits
            .into_iter()
            .skip(usize::try_from(criteria.offset).unwrap_or(usize::MAX))
            .take(criteria.limit as usize)
            .map(|p| if enrich { state.populate(p) } else { p })
            .collect();
        Ok((page, total))
    }

    async fn related(&self, product: &Product, limit: u32) -> RepoResult<Vec<Product>> {
        let state = self.state.lock();
        state.check()?;
        let own_tags = state.product_tags.get(&product.id).cloned().unwrap_or_default();
        let mut hits: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.id != product.id)
            .filter(|p| {
                (product.category_id.is_some() && p.category_id == product.category_id)
                    || state
                        .product_tags
                        .get(&p.id)
                        .is_some_and(|tags| tags.iter().any(|t| own_tags.contains(t)))
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hits.truncate(limit as usize);
        Ok(hits.into_iter().map(|p| state.populate(p)).collect())
    }
}

#[async_trait]
impl CategoryStore for MemoryCatalog {
    async fn exists_by_id(&self, id: i64) -> RepoResult<bool> {
        let state = self.state.lock();
        state.check()?;
        Ok(state.categories.contains_key(&id))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Category>> {
        let state = self.state.lock();
        state.check()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.categories.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl TagStore for MemoryCatalog {
    async fn exists_by_id(&self, id: i64) -> RepoResult<bool> {
        let state = self.state.lock();
        state.check()?;
        Ok(state.tags.contains_key(&id))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Tag>> {
        let state = self.state.lock();
        state.check()?;
        Ok(ids.iter().filter_map(|id| state.tags.get(id).cloned()).collect())
    }
}
