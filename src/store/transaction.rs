//! Transaction bodies, stored once per hash regardless of how many addresses reference them.

use super::keys::StoreKey;
use super::{StoreError, StoreResult};
use crate::db::{Database, DbError};
use crate::models::Transaction;

pub(crate) async fn read_transaction<D: Database>(db: &D, hash: &str) -> StoreResult<Transaction> {
    match db.get(&StoreKey::transaction(hash).to_bytes()).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(DbError::NotFound) => Err(StoreError::MissingTransaction(hash.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Persist `tx` unless a body with the same hash exists. Returns whether it was written.
pub(crate) async fn insert_if_absent<D: Database>(db: &D, tx: &Transaction) -> StoreResult<bool> {
    let key = StoreKey::transaction(&tx.hash).to_bytes();
    match db.get(&key).await {
        Ok(_) => return Ok(false),
        Err(DbError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    db.set(&key, serde_json::to_vec(tx)?).await?;
    Ok(true)
}
