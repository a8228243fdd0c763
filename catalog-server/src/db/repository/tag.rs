//! Tag Repository

use super::{RepoError, RepoResult, placeholders};
use shared::models::{Tag, TagCreate, TagUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, created_at, updated_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Tag>> {
    let sql = format!("SELECT {COLUMNS} FROM tag ORDER BY name");
    let tags = sqlx::query_as::<_, Tag>(&sql).fetch_all(pool).await?;
    Ok(tags)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Tag>> {
    let sql = format!("SELECT {COLUMNS} FROM tag WHERE id = ?");
    let tag = sqlx::query_as::<_, Tag>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(tag)
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Tag>> {
    let sql = format!("SELECT {COLUMNS} FROM tag WHERE name = ? COLLATE NOCASE LIMIT 1");
    let tag = sqlx::query_as::<_, Tag>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(tag)
}

pub async fn find_by_ids(pool: &SqlitePool, ids: &[i64]) -> RepoResult<Vec<Tag>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {COLUMNS} FROM tag WHERE id IN ({}) ORDER BY name",
        placeholders(ids.len())
    );
    let mut query = sqlx::query_as::<_, Tag>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn exists_by_id(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM tag WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Tags attached to each of the given products, as `(product_id, tag)` pairs
pub async fn find_for_products(
    pool: &SqlitePool,
    product_ids: &[i64],
) -> RepoResult<Vec<(i64, Tag)>> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT pt.product_id, t.id, t.name, t.created_at, t.updated_at \
         FROM product_tag pt JOIN tag t ON t.id = pt.tag_id \
         WHERE pt.product_id IN ({}) ORDER BY t.name",
        placeholders(product_ids.len())
    );
    let mut query = sqlx::query_as::<_, (i64, i64, String, i64, i64)>(&sql);
    for id in product_ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(product_id, id, name, created_at, updated_at)| {
            (
                product_id,
                Tag {
                    id,
                    name,
                    created_at,
                    updated_at,
                },
            )
        })
        .collect())
}

pub async fn create(pool: &SqlitePool, data: TagCreate) -> RepoResult<Tag> {
    let name = data.name.trim().to_string();
    if find_by_name(pool, &name).await?.is_some() {
        return Err(RepoError::Duplicate(format!("Tag '{}' already exists", name)));
    }

    let id = snowflake_id();
    let now = now_millis();
    sqlx::query("INSERT INTO tag (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(&name)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create tag".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: TagUpdate) -> RepoResult<Tag> {
    let name = data.name.as_deref().map(str::trim);
    if let Some(new_name) = name
        && let Some(other) = find_by_name(pool, new_name).await?
        && other.id != id
    {
        return Err(RepoError::Duplicate(format!(
            "Tag '{}' already exists",
            new_name
        )));
    }

    let rows = sqlx::query("UPDATE tag SET name = COALESCE(?1, name), updated_at = ?2 WHERE id = ?3")
        .bind(name)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Tag {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Tag {id} not found")))
}

/// Hard delete a tag; product associations cascade
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM tag WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
