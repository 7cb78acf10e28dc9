use crate::error::{DbError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "arqui.db".to_string() }
    }
}

/// Shared handle on the reporting database. Every report store opened from it
/// shares the same connection pool.
pub struct Database {
    pool: Option<Pool<Sqlite>>,
    created: bool,
}

impl Database {
    /// Connect to the database, creating the file when it does not exist yet.
    ///
    /// Any failure to reach the database is reported as [`DbError::SchemaInit`].
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let path = Path::new(&config.path);
        let created = !path.exists();

        let pool = Self::create_pool(&config).await?;

        sqlx::query("SELECT 1").execute(&pool).await.map_err(|e| {
            DbError::SchemaInit(format!("could not reach {}: {}", config.path, e))
        })?;

        if created {
            info!("Created database: {}", config.path);
        } else {
            debug!("Using existing database: {}", config.path);
        }

        Ok(Self { pool: Some(pool), created })
    }

    async fn create_pool(config: &DatabaseConfig) -> Result<Pool<Sqlite>> {
        let path = Path::new(&config.path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbError::SchemaInit(format!(
                        "could not create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
                info!("Created database directory: {}", parent.display());
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                DbError::SchemaInit(format!("could not connect to {}: {}", config.path, e))
            })?;

        info!("Database connection pool created: {}", config.path);

        Ok(pool)
    }

    pub fn pool(&self) -> Result<&Pool<Sqlite>> {
        self.pool.as_ref().ok_or_else(|| DbError::SchemaInit("Database pool closed".to_string()))
    }

    /// Whether this handle created the database file.
    pub fn created(&self) -> bool {
        self.created
    }

    /// Close the pool. Stores opened from this handle stop working; further calls do nothing.
    pub async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            info!("Database connection pool closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_database_creation() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let config = DatabaseConfig { path: db_path.to_str().unwrap().to_string() };

        let db = Database::new(config).await.unwrap();
        assert!(db.created());
        assert!(db_path.exists());

        let pool = db.pool().unwrap();
        let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await.unwrap();

        assert_eq!(result, 1);
    }

    #[tokio::test]
    async fn test_database_reopen_is_not_created() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let config = DatabaseConfig { path: db_path.to_str().unwrap().to_string() };

        let mut first = Database::new(config.clone()).await.unwrap();
        first.close().await;

        let second = Database::new(config).await.unwrap();
        assert!(!second.created());
    }

    #[tokio::test]
    async fn test_database_with_subdirectory() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("subdir").join("test.db");

        let config = DatabaseConfig { path: db_path.to_str().unwrap().to_string() };

        let db = Database::new(config).await.unwrap();
        assert!(db.pool().is_ok());
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_database_path_with_url_characters() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reports?mode=ro#1.db");

        let config = DatabaseConfig { path: db_path.to_str().unwrap().to_string() };

        let db = Database::new(config).await.unwrap();
        assert!(db.created());
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_unreachable_database_is_schema_init_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let db_path = blocker.join("test.db");

        let config = DatabaseConfig { path: db_path.to_str().unwrap().to_string() };

        let result = Database::new(config).await;
        assert!(matches!(result, Err(DbError::SchemaInit(_))));
    }

    #[tokio::test]
    async fn test_database_close_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let config = DatabaseConfig { path: db_path.to_str().unwrap().to_string() };

        let mut db = Database::new(config).await.unwrap();
        db.close().await;
        db.close().await;
        assert!(db.pool().is_err());
    }
}
