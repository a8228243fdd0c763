//! User Repository

use super::{RepoError, RepoResult};
use shared::models::User;
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, full_name, email, password_hash, created_at, updated_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let sql = format!("SELECT {COLUMNS} FROM user ORDER BY created_at");
    Ok(sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM user WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM user WHERE email = ? COLLATE NOCASE LIMIT 1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Insert a user; `password_hash` must already be hashed
pub async fn create(
    pool: &SqlitePool,
    full_name: &str,
    email: &str,
    password_hash: &str,
) -> RepoResult<User> {
    if find_by_email(pool, email).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Email '{}' is already registered",
            email
        )));
    }

    let id = snowflake_id();
    let now = now_millis();
    sqlx::query(
        "INSERT INTO user (id, full_name, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(full_name)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    full_name: Option<&str>,
    email: Option<&str>,
    password_hash: Option<&str>,
) -> RepoResult<User> {
    if let Some(new_email) = email
        && let Some(other) = find_by_email(pool, new_email).await?
        && other.id != id
    {
        return Err(RepoError::Duplicate(format!(
            "Email '{}' is already registered",
            new_email
        )));
    }

    let rows = sqlx::query(
        "UPDATE user SET full_name = COALESCE(?1, full_name), email = COALESCE(?2, email), \
         password_hash = COALESCE(?3, password_hash), updated_at = ?4 WHERE id = ?5",
    )
    .bind(full_name)
    .bind(email)
    .bind(password_hash)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM user WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::testing::test_pool;

    #[tokio::test]
    async fn test_create_and_find_by_email() {
        let pool = test_pool().await;
        let user = create(&pool, "Ada Lovelace", "ada@example.com", "hash")
            .await
            .unwrap();

        let found = find_by_email(&pool, "ADA@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let pool = test_pool().await;
        create(&pool, "A", "a@example.com", "h").await.unwrap();
        let err = create(&pool, "B", "a@example.com", "h").await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let pool = test_pool().await;
        let user = create(&pool, "A", "a@example.com", "h").await.unwrap();
        let updated = update(&pool, user.id, Some("Alice"), None, None)
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Alice");
        assert_eq!(updated.email, "a@example.com");
        assert_eq!(updated.password_hash, "h");

        assert!(delete(&pool, user.id).await.unwrap());
        assert!(matches!(
            update(&pool, user.id, Some("x"), None, None).await,
            Err(RepoError::NotFound(_))
        ));
    }
}
