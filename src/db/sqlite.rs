use super::{Database, DbError};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// Durable key/value backend over a single `kv` table.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn check_open(&self) -> Result<(), DbError> {
        if self.pool.is_closed() {
            return Err(DbError::Closed);
        }
        Ok(())
    }
}

fn map_err(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::PoolClosed => DbError::Closed,
        other => DbError::Sqlite(other),
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, DbError> {
        self.check_open()?;
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;

        match row {
            Some(row) => Ok(row.try_get("value").map_err(map_err)?),
            None => Err(DbError::NotFound),
        }
    }

    async fn set(&self, key: &[u8], value: Vec<u8>) -> Result<(), DbError> {
        self.check_open()?;
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), DbError> {
        self.check_open()?;
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<Vec<u8>>, DbError> {
        self.check_open()?;
        let rows = sqlx::query("SELECT key FROM kv")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;

        rows.iter()
            .map(|row| row.try_get::<Vec<u8>, _>("key").map_err(map_err))
            .collect()
    }
}
