//! Address index store.
//!
//! Maps subscribed addresses to ordered, deduplicated transaction-hash lists and
//! hashes to transaction bodies, on top of any [`Database`] backend. A store-wide
//! read/write lock makes each multi-step update appear atomic to readers.

mod address;
pub mod keys;
mod transaction;

use crate::db::{Database, DbError};
use crate::models::Transaction;
use async_trait::async_trait;
use num_bigint::BigUint;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

pub use keys::StoreKey;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("address is not subscribed: {0}")]
    Subscription(String),

    #[error("storage closed")]
    StorageClosed,

    #[error("transaction body missing for hash {0}")]
    MissingTransaction(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(DbError),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Closed => StoreError::StorageClosed,
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage capabilities the indexing engine and its callers rely on.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Idempotently register `address` with an empty hash list and zero balance.
    async fn subscribe_address(&self, address: &str) -> StoreResult<()>;

    async fn is_subscribed_address(&self, address: &str) -> StoreResult<bool>;

    /// Record `tx` for a subscribed `address`. Repeating the call is a no-op.
    async fn add_address_transaction(&self, address: &str, tx: &Transaction) -> StoreResult<()>;

    /// Transactions recorded for `address`, oldest first.
    async fn get_transactions_by_address(&self, address: &str) -> StoreResult<Vec<Transaction>>;

    async fn get_addresses_with_balances(&self) -> StoreResult<BTreeMap<String, BigUint>>;

    /// Overwrite the cached balance of a subscribed address.
    async fn set_address_balance(&self, address: &str, balance: BigUint) -> StoreResult<()>;

    async fn save_indexed_block_number(&self, height: u64) -> StoreResult<()>;

    async fn get_indexed_block_number(&self) -> StoreResult<Option<u64>>;
}

pub struct AddressIndexStore<D> {
    db: D,
    lock: RwLock<()>,
}

impl<D: Database> AddressIndexStore<D> {
    pub fn new(db: D) -> Self {
        Self {
            db,
            lock: RwLock::new(()),
        }
    }

    /// The backing database, e.g. to close it.
    pub fn database(&self) -> &D {
        &self.db
    }
}

#[async_trait]
impl<D: Database> Storage for AddressIndexStore<D> {
    async fn subscribe_address(&self, address: &str) -> StoreResult<()> {
        let _guard = self.lock.write().await;

        if address::is_subscribed(&self.db, address).await? {
            return Ok(());
        }

        let mut balances = address::read_balances(&self.db).await?;
        balances.entry(address.to_string()).or_default();
        address::write_balances(&self.db, &balances).await?;

        // New subscriptions have no transactions yet.
        address::write_hash_list(&self.db, address, &[]).await?;
        // Marker last: a subscribed address always has a hash list.
        address::mark_subscribed(&self.db, address).await?;
        debug!("Subscribed address {}", address);
        Ok(())
    }

    async fn is_subscribed_address(&self, address: &str) -> StoreResult<bool> {
        let _guard = self.lock.read().await;
        address::is_subscribed(&self.db, address).await
    }

    async fn add_address_transaction(&self, address: &str, tx: &Transaction) -> StoreResult<()> {
        let _guard = self.lock.write().await;

        let mut hashes = address::read_hash_list(&self.db, address)
            .await?
            .ok_or_else(|| StoreError::Subscription(address.to_string()))?;

        // Body first, so a listed hash always resolves.
        if transaction::insert_if_absent(&self.db, tx).await? {
            debug!("Stored transaction body {}", tx.hash);
        }

        if hashes.iter().any(|h| h == &tx.hash) {
            return Ok(());
        }
        hashes.push(tx.hash.clone());
        address::write_hash_list(&self.db, address, &hashes).await
    }

    async fn get_transactions_by_address(&self, address: &str) -> StoreResult<Vec<Transaction>> {
        let _guard = self.lock.read().await;

        let hashes = address::read_hash_list(&self.db, address)
            .await?
            .ok_or_else(|| StoreError::Subscription(address.to_string()))?;

        let mut transactions = Vec::with_capacity(hashes.len());
        for hash in &hashes {
            transactions.push(transaction::read_transaction(&self.db, hash).await?);
        }
        Ok(transactions)
    }

    async fn get_addresses_with_balances(&self) -> StoreResult<BTreeMap<String, BigUint>> {
        let _guard = self.lock.read().await;
        let balances = address::read_balances(&self.db).await?;
        Ok(balances.into_iter().map(|(addr, b)| (addr, b.0)).collect())
    }

    async fn set_address_balance(&self, address: &str, balance: BigUint) -> StoreResult<()> {
        let _guard = self.lock.write().await;

        let mut balances = address::read_balances(&self.db).await?;
        match balances.get_mut(address) {
            Some(entry) => entry.0 = balance,
            None => return Err(StoreError::Subscription(address.to_string())),
        }
        address::write_balances(&self.db, &balances).await
    }

    async fn save_indexed_block_number(&self, height: u64) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let bytes = serde_json::to_vec(&height)?;
        self.db
            .set(&StoreKey::IndexedBlockNumber.to_bytes(), bytes)
            .await?;
        Ok(())
    }

    async fn get_indexed_block_number(&self) -> StoreResult<Option<u64>> {
        let _guard = self.lock.read().await;
        match self.db.get(&StoreKey::IndexedBlockNumber.to_bytes()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(DbError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
