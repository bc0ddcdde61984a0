use super::{Database, DbError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory key/value database.
///
/// `None` marks a closed database; every operation after [`MemoryDatabase::close`]
/// fails with [`DbError::Closed`].
#[derive(Debug)]
pub struct MemoryDatabase {
    db: RwLock<Option<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self {
            db: RwLock::new(Some(HashMap::new())),
        }
    }

    pub async fn close(&self) {
        *self.db.write().await = None;
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, DbError> {
        let guard = self.db.read().await;
        let db = guard.as_ref().ok_or(DbError::Closed)?;
        db.get(key).cloned().ok_or(DbError::NotFound)
    }

    async fn set(&self, key: &[u8], value: Vec<u8>) -> Result<(), DbError> {
        let mut guard = self.db.write().await;
        let db = guard.as_mut().ok_or(DbError::Closed)?;
        db.insert(key.to_vec(), value);
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), DbError> {
        let mut guard = self.db.write().await;
        let db = guard.as_mut().ok_or(DbError::Closed)?;
        db.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<Vec<u8>>, DbError> {
        let guard = self.db.read().await;
        let db = guard.as_ref().ok_or(DbError::Closed)?;
        Ok(db.keys().cloned().collect())
    }
}
