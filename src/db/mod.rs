//! Byte-keyed storage collaborator.
//!
//! Any backend implementing [`Database`] can sit under the address index store.
//! [`memory::MemoryDatabase`] is the default; [`sqlite::SqliteDatabase`] is a
//! durable substitute.

pub mod connection;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryDatabase;
pub use sqlite::SqliteDatabase;

pub const INIT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key BLOB PRIMARY KEY,
    value BLOB NOT NULL
);
"#;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("key not found")]
    NotFound,

    #[error("database closed")]
    Closed,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),
}

/// Minimal get/set/delete/enumerate primitive.
#[async_trait]
pub trait Database: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, DbError>;

    async fn set(&self, key: &[u8], value: Vec<u8>) -> Result<(), DbError>;

    async fn delete(&self, key: &[u8]) -> Result<(), DbError>;

    async fn keys(&self) -> Result<Vec<Vec<u8>>, DbError>;
}
