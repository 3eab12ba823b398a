use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// SQLite-backed relational store holding `users`, `posts` and `followers`.
///
/// Only `followers` is written by this crate's services; the other two tables
/// belong to the user and post collaborators and are read through
/// [`crate::infrastructure::traits`].
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect to `database_url`, creating the database file if needed.
    ///
    /// An in-memory database lives only as long as its connection, so those
    /// pools are pinned to a single connection that is never recycled.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        if let Some(path) = database_file(database_url) {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let in_memory = database_url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Database(format!("Invalid database url {}: {}", database_url, e)))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to {}: {}", database_url, e)))?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes if they are missing.
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY NOT NULL,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY NOT NULL,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                description TEXT,
                pictures_urls TEXT NOT NULL DEFAULT '[]'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create posts table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS followers (
                followed_by TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                follows TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                accepted BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                PRIMARY KEY (followed_by, follows),
                CHECK (followed_by <> follows)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create followers table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_followers_follows ON followers(follows)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create followers index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_user_id ON posts(user_id, created_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create posts index: {}", e)))?;

        tracing::debug!("database schema initialized");
        Ok(())
    }

    /// Health check to verify database connectivity
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Database health check failed: {}", e)))?;
        Ok(())
    }
}

/// Path of the database file named by a `sqlite:` url, if it names one.
fn database_file(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    Some(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_file_parsing() {
        assert_eq!(
            database_file("sqlite:data/social_feed.db"),
            Some(PathBuf::from("data/social_feed.db"))
        );
        assert_eq!(
            database_file("sqlite:///tmp/feed.db?mode=rwc"),
            Some(PathBuf::from("/tmp/feed.db"))
        );
        assert_eq!(database_file("sqlite::memory:"), None);
        assert_eq!(database_file("postgres://localhost/db"), None);
    }

    #[tokio::test]
    async fn test_in_memory_schema_and_health() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        db.health_check().await.unwrap();
        // initialize is idempotent
        db.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn test_followers_rejects_self_edge() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        sqlx::query("INSERT INTO users (id, email, created_at) VALUES ('u1', 'u1@example.com', '2024-01-01T00:00:00Z')")
            .execute(db.pool())
            .await
            .unwrap();

        let result = sqlx::query(
            "INSERT INTO followers (followed_by, follows, accepted, created_at) VALUES ('u1', 'u1', 0, '2024-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }
}
