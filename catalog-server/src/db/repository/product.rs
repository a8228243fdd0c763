//! Product Repository
//!
//! Rows are loaded bare; [`populate`] attaches category and tags.

use std::collections::HashMap;

use super::{RepoError, RepoResult, category, placeholders, tag};
use crate::catalog::query::{Condition, Field, Op, Predicate, QueryCriteria, Value};
use crate::catalog::store::ProductRecord;
use crate::db::query_builder::{QueryBuilder, QueryValue, like_pattern};
use shared::models::Product;
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "p.id, p.name, p.description, p.price, p.stock, p.brand, p.category_id, \
                       p.sku, p.slug, p.created_at, p.updated_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM product p ORDER BY p.created_at, p.id");
    Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await?)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM product p WHERE p.id = ?");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> RepoResult<Option<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM product p WHERE p.slug = ? COLLATE NOCASE LIMIT 1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

pub async fn find_by_sku(pool: &SqlitePool, sku: &str) -> RepoResult<Option<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM product p WHERE p.sku = ? COLLATE NOCASE LIMIT 1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(sku)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

pub async fn find_by_name_key(pool: &SqlitePool, name_key: &str) -> RepoResult<Vec<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM product p WHERE p.name_key = ? ORDER BY p.created_at");
    Ok(sqlx::query_as::<_, Product>(&sql)
        .bind(name_key)
        .fetch_all(pool)
        .await?)
}

pub async fn exists_by_id(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM product WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Attach category and tags to each product
pub async fn populate(pool: &SqlitePool, mut products: Vec<Product>) -> RepoResult<Vec<Product>> {
    if products.is_empty() {
        return Ok(products);
    }

    let mut category_ids: Vec<i64> = products.iter().filter_map(|p| p.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();
    let categories: HashMap<i64, _> = category::find_by_ids(pool, &category_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let product_ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    let mut tags: HashMap<i64, Vec<_>> = HashMap::new();
    for (product_id, t) in tag::find_for_products(pool, &product_ids).await? {
        tags.entry(product_id).or_default().push(t);
    }

    for product in &mut products {
        product.category = product
            .category_id
            .and_then(|id| categories.get(&id).cloned());
        product.tags = tags.remove(&product.id).unwrap_or_default();
    }
    Ok(products)
}

pub async fn find_populated(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    match find_by_id(pool, id).await? {
        Some(p) => Ok(populate(pool, vec![p]).await?.into_iter().next()),
        None => Ok(None),
    }
}

async fn replace_tags(conn: &mut SqliteConnection, product_id: i64, tag_ids: &[i64]) -> RepoResult<()> {
    sqlx::query("DELETE FROM product_tag WHERE product_id = ?")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO product_tag (product_id, tag_id) VALUES (?, ?)")
            .bind(product_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Insert the product and its tag associations in one transaction
pub async fn create(pool: &SqlitePool, record: ProductRecord, tag_ids: &[i64]) -> RepoResult<Product> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO product (id, name, name_key, description, search_name, search_description, \
         price, stock, brand, category_id, sku, slug, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.id)
    .bind(&record.name)
    .bind(&record.name_key)
    .bind(&record.description)
    .bind(fold_case(&record.name))
    .bind(fold_case(record.description.as_deref().unwrap_or_default()))
    .bind(record.price)
    .bind(record.stock)
    .bind(&record.brand)
    .bind(record.category_id)
    .bind(&record.sku)
    .bind(&record.slug)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&mut *tx)
    .await?;

    replace_tags(&mut tx, record.id, tag_ids).await?;
    tx.commit().await?;

    find_populated(pool, record.id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Overwrite every column of the product; `Some(tags)` replaces the
/// association set in the same transaction
pub async fn update(
    pool: &SqlitePool,
    record: ProductRecord,
    tag_ids: Option<&[i64]>,
) -> RepoResult<Product> {
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE product SET name = ?, name_key = ?, description = ?, search_name = ?, search_description = ?, \
         price = ?, stock = ?, brand = ?, category_id = ?, sku = ?, slug = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&record.name)
    .bind(&record.name_key)
    .bind(&record.description)
    .bind(fold_case(&record.name))
    .bind(fold_case(record.description.as_deref().unwrap_or_default()))
    .bind(record.price)
    .bind(record.stock)
    .bind(&record.brand)
    .bind(record.category_id)
    .bind(&record.sku)
    .bind(&record.slug)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {} not found", record.id)));
    }

    if let Some(ids) = tag_ids {
        replace_tags(&mut tx, record.id, ids).await?;
    }
    tx.commit().await?;

    find_populated(pool, record.id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", record.id)))
}

pub async fn set_tags(pool: &SqlitePool, product_id: i64, tag_ids: &[i64]) -> RepoResult<()> {
    let mut tx = pool.begin().await?;
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM product WHERE id = ?")
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(RepoError::NotFound(format!("Product {product_id} not found")));
    }
    replace_tags(&mut tx, product_id, tag_ids).await?;
    tx.commit().await?;
    Ok(())
}

/// Hard delete; tag associations cascade
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM product WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Search columns hold this form; SQLite's `LIKE` folds ASCII only
fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Column a substring match runs against
fn search_column(field: Field) -> &'static str {
    match field {
        Field::Name => "p.search_name",
        Field::Description => "p.search_description",
        other => column(other),
    }
}

fn column(field: Field) -> &'static str {
    match field {
        Field::Id => "p.id",
        Field::Name => "p.name",
        Field::Description => "p.description",
        Field::Price => "p.price",
        Field::Stock => "p.stock",
        Field::Sku => "p.sku",
        Field::CategoryId => "p.category_id",
        Field::TagId => "pt.tag_id",
        Field::CreatedAt => "p.created_at",
        Field::UpdatedAt => "p.updated_at",
    }
}

fn scalar(value: &Value) -> Vec<QueryValue> {
    match value {
        Value::Integer(i) => vec![QueryValue::Integer(*i)],
        Value::Float(f) => vec![QueryValue::Float(*f)],
        Value::Text(s) => vec![QueryValue::Text(s.clone())],
        Value::IntegerList(ids) => ids.iter().map(|i| QueryValue::Integer(*i)).collect(),
    }
}

/// SQL fragment and bindings for one predicate
fn render_predicate(pred: &Predicate) -> (String, Vec<QueryValue>) {
    let col = column(pred.field);
    let (expr, values) = match (pred.op, &pred.value) {
        (Op::Contains, Value::Text(text)) => (
            format!("{} LIKE ? ESCAPE '\\'", search_column(pred.field)),
            vec![QueryValue::Text(like_pattern(&fold_case(text)))],
        ),
        (Op::In, value) => {
            let values = scalar(value);
            (format!("{col} IN ({})", placeholders(values.len())), values)
        }
        (Op::Eq, value) => (format!("{col} = ?"), scalar(value)),
        (Op::Gte, value) => (format!("{col} >= ?"), scalar(value)),
        (Op::Lte, value) => (format!("{col} <= ?"), scalar(value)),
        (Op::Contains, value) => (format!("{col} = ?"), scalar(value)),
    };

    if pred.field == Field::TagId {
        (
            format!("EXISTS (SELECT 1 FROM product_tag pt WHERE pt.product_id = p.id AND {expr})"),
            values,
        )
    } else {
        (expr, values)
    }
}

/// Render the criteria's conditions as a WHERE clause over `product p`
pub fn render_where(criteria: &QueryCriteria) -> QueryBuilder {
    let mut builder = QueryBuilder::new();
    for condition in &criteria.conditions {
        let (expr, values) = match condition {
            Condition::Predicate(pred) => render_predicate(pred),
            Condition::AnyOf(preds) if preds.is_empty() => continue,
            Condition::AnyOf(preds) => {
                let mut parts = Vec::with_capacity(preds.len());
                let mut values = Vec::new();
                for pred in preds {
                    let (expr, v) = render_predicate(pred);
                    parts.push(expr);
                    values.extend(v);
                }
                (format!("({})", parts.join(" OR ")), values)
            }
        };
        builder.add_condition(expr);
        for v in values {
            builder.bind(v);
        }
    }
    builder
}

/// One page of products matching the criteria, plus the total match count
pub async fn query(pool: &SqlitePool, criteria: &QueryCriteria) -> RepoResult<(Vec<Product>, u64)> {
    let builder = render_where(criteria);
    let where_clause = builder.build_where_clause();

    let count_sql = format!("SELECT COUNT(*) FROM product p{where_clause}");
    let total: i64 = builder
        .apply_bindings_scalar(sqlx::query_scalar(&count_sql))
        .fetch_one(pool)
        .await?;

    let order = criteria.sort_order.as_sql();
    let sql = format!(
        "SELECT {COLUMNS} FROM product p{where_clause} ORDER BY {} {order}, p.id {order} LIMIT ? OFFSET ?",
        column(criteria.sort_by.field()),
    );
    let items = builder
        .apply_bindings(sqlx::query_as::<_, Product>(&sql))
        .bind(i64::from(criteria.limit))
        .bind(i64::try_from(criteria.offset).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await?;

    let items = if criteria.relations.is_empty() {
        items
    } else {
        populate(pool, items).await?
    };
    Ok((items, total.max(0) as u64))
}

/// Products sharing the category or any tag with `product`, newest first
pub async fn related(pool: &SqlitePool, product: &Product, limit: u32) -> RepoResult<Vec<Product>> {
    let tag_ids: Vec<i64> = sqlx::query_scalar("SELECT tag_id FROM product_tag WHERE product_id = ?")
        .bind(product.id)
        .fetch_all(pool)
        .await?;

    let mut any = Vec::new();
    let mut builder = QueryBuilder::new();
    builder.add_condition("p.id != ?").bind_i64(product.id);
    if let Some(category_id) = product.category_id {
        any.push("p.category_id = ?".to_string());
        builder.bind_i64(category_id);
    }
    if !tag_ids.is_empty() {
        any.push(format!(
            "EXISTS (SELECT 1 FROM product_tag pt WHERE pt.product_id = p.id AND pt.tag_id IN ({}))",
            placeholders(tag_ids.len())
        ));
        for id in &tag_ids {
            builder.bind_i64(*id);
        }
    }
    if any.is_empty() {
        return Ok(Vec::new());
    }
    builder.add_condition(format!("({})", any.join(" OR ")));

    let sql = format!(
        "SELECT {COLUMNS} FROM product p{} ORDER BY p.created_at DESC, p.id DESC LIMIT ?",
        builder.build_where_clause()
    );
    let items = builder
        .apply_bindings(sqlx::query_as::<_, Product>(&sql))
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;
    populate(pool, items).await
}
