// SQL-backed implementations of the user directory and post source

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use tokio::sync::Mutex;

use crate::core::UserId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::traits::{PostSource, UserDirectory};
use crate::models::Post;

/// User directory over the `users` table.
///
/// Positive existence lookups are remembered in an LRU cache. Users are never
/// deleted through this crate, so a cached hit stays valid for the process.
pub struct SqlUserDirectory {
    pool: SqlitePool,
    known_users: Mutex<Cache<UserId, ()>>,
}

impl SqlUserDirectory {
    pub fn new(pool: SqlitePool, cache_capacity: usize) -> Self {
        Self {
            pool,
            known_users: Mutex::new(Cache::new(cache_capacity)),
        }
    }
}

#[async_trait]
impl UserDirectory for SqlUserDirectory {
    async fn all_users(&self) -> AppResult<Vec<UserId>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))?;

        Ok(ids.into_iter().map(UserId::from).collect())
    }

    async fn user_exists(&self, id: &UserId) -> AppResult<bool> {
        if !id.is_valid() {
            return Ok(false);
        }

        if self.known_users.lock().await.get(id).is_some() {
            return Ok(true);
        }

        let row = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to check if user {} exists: {}", id, e))
            })?;

        if row.is_some() {
            self.known_users.lock().await.insert(id.clone(), ());
        }
        Ok(row.is_some())
    }
}

/// Post source over the `posts` table.
pub struct SqlPostSource {
    pool: SqlitePool,
}

impl SqlPostSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostSource for SqlPostSource {
    async fn posts_by_user(&self, author: &UserId) -> AppResult<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT id, user_id, created_at, description, pictures_urls FROM posts WHERE user_id = ?",
        )
        .bind(author.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get posts for {}: {}", author, e)))?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let pictures: String = row.get("pictures_urls");
            let pictures_urls: Vec<String> = serde_json::from_str(&pictures).map_err(|e| {
                AppError::Other(format!("Malformed pictures_urls on post {}: {}", id, e))
            })?;
            let created_at: DateTime<Utc> = row.try_get("created_at").map_err(|e| {
                AppError::Database(format!("Malformed created_at on post {}: {}", id, e))
            })?;

            posts.push(Post {
                id,
                user_id: UserId::from(row.get::<String, _>("user_id")),
                created_at,
                description: row.get("description"),
                pictures_urls,
            });
        }

        Ok(posts)
    }
}
