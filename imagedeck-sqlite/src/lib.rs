use chrono::Utc;
use imagedeck_core::{CoreError, KeyValueStore};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

pub struct SqliteKv {
    pool: SqlitePool,
}

impl SqliteKv {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let url = format!("sqlite://{}", path.as_ref().to_string_lossy());
        let opts = SqliteConnectOptions::from_str(&url)
            .map_err(|_| CoreError::Invalid("sqlite path"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        tracing::debug!(path = %path.as_ref().display(), "sqlite store opened");
        Ok(repo)
    }

    /// Every pooled connection to `:memory:` is its own database, so the pool
    /// is pinned to one connection that never expires.
    pub async fn open_memory() -> Result<Self, CoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS kv (
          key         TEXT PRIMARY KEY,
          value       TEXT NOT NULL,
          updated_at  TEXT NOT NULL
        )
        "#;
        sqlx::query(STMT)
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("sqlite schema"))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key=?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read kv"))?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO kv (key,value,updated_at) VALUES (?,?,?)
               ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at"#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(key, error = %e, "sqlite write failed");
            CoreError::Storage("write kv")
        })?;
        Ok(())
    }
}
