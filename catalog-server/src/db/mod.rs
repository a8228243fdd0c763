//! Database Module
//!
//! Handles SQLite connection pool and migrations

pub mod query_builder;
pub mod repository;

use std::str::FromStr;

use async_trait::async_trait;
use shared::error::AppError;
use shared::models::{Category, Product, Tag};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::catalog::query::QueryCriteria;
use crate::catalog::store::{CategoryStore, ProductRecord, ProductStore, TagStore};
use repository::{RepoResult, category, product, tag};

const MEMORY_PATH: &str = ":memory:";

/// Database service - owns a SQLite connection pool
#[derive(Debug, Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (or create) the database at `db_path` with WAL mode and apply migrations.
    ///
    /// `:memory:` opens a private single-connection database.
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let in_memory = db_path == MEMORY_PATH;

        if !in_memory
            && let Some(parent) = std::path::Path::new(db_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::database(format!("Failed to create database directory: {e}"))
            })?;
        }

        let mut options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_millis(5000));
        if !in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .optimize_on_close(true, None);
        }

        let mut pool_options = SqlitePoolOptions::new().max_connections(5);
        if in_memory {
            // The database lives exactly as long as its only connection
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        tracing::info!(
            path = %db_path,
            "Database connection established (SQLite WAL, busy_timeout=5000ms)"
        );

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// `true` when a trivial query round-trips
    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

/// Catalog stores backed by the SQLite repositories
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for SqliteCatalog {
    async fn find_all(&self) -> RepoResult<Vec<Product>> {
        product::find_all(&self.pool).await
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Product>> {
        product::find_populated(&self.pool, id).await
    }

    async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Product>> {
        product::find_by_slug(&self.pool, slug).await
    }

    async fn find_by_sku(&self, sku: &str) -> RepoResult<Option<Product>> {
        product::find_by_sku(&self.pool, sku).await
    }

    async fn find_by_name_key(&self, name_key: &str) -> RepoResult<Vec<Product>> {
        product::find_by_name_key(&self.pool, name_key).await
    }

    async fn exists_by_id(&self, id: i64) -> RepoResult<bool> {
        product::exists_by_id(&self.pool, id).await
    }

    async fn create(&self, record: ProductRecord, tag_ids: &[i64]) -> RepoResult<Product> {
        product::create(&self.pool, record, tag_ids).await
    }

    async fn update(&self, record: ProductRecord, tag_ids: Option<&[i64]>) -> RepoResult<Product> {
        product::update(&self.pool, record, tag_ids).await
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        product::delete(&self.pool, id).await
    }

    async fn set_tags(&self, id: i64, tag_ids: &[i64]) -> RepoResult<()> {
        product::set_tags(&self.pool, id, tag_ids).await
    }

    async fn query(&self, criteria: &QueryCriteria) -> RepoResult<(Vec<Product>, u64)> {
        product::query(&self.pool, criteria).await
    }

    async fn related(&self, product: &Product, limit: u32) -> RepoResult<Vec<Product>> {
        product::related(&self.pool, product, limit).await
    }
}

#[async_trait]
impl CategoryStore for SqliteCatalog {
    async fn exists_by_id(&self, id: i64) -> RepoResult<bool> {
        category::exists_by_id(&self.pool, id).await
    }

    async fn find_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Category>> {
        category::find_by_ids(&self.pool, ids).await
    }
}

#[async_trait]
impl TagStore for SqliteCatalog {
    async fn exists_by_id(&self, id: i64) -> RepoResult<bool> {
        tag::exists_by_id(&self.pool, id).await
    }

    async fn find_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Tag>> {
        tag::find_by_ids(&self.pool, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_database_applies_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.db");
        let db = DbService::new(path.to_str().unwrap()).await.unwrap();

        assert!(db.ping().await);
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('product', 'category', 'tag', 'product_tag', 'user')",
        )
        .fetch_one(&db.pool)
        .await
        .unwrap();
        assert_eq!(tables, 5);
    }

    #[tokio::test]
    async fn test_memory_database() {
        let db = DbService::new(":memory:").await.unwrap();
        let catalog = SqliteCatalog::new(db.pool.clone());
        assert!(!ProductStore::exists_by_id(&catalog, 1).await.unwrap());
        assert!(CategoryStore::find_by_ids(&catalog, &[1]).await.unwrap().is_empty());
    }
}
