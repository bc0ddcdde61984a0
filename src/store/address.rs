//! Subscribed-address records: per-address hash lists and the balance table.
//!
//! Helpers here assume the caller holds the store lock.

use super::keys::StoreKey;
use super::StoreResult;
use crate::codec::serde_hex;
use crate::db::{Database, DbError};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Balance(#[serde(with = "serde_hex")] pub BigUint);

pub(crate) type BalanceTable = BTreeMap<String, Balance>;

/// Membership check against the subscription marker, independent of list size.
pub(crate) async fn is_subscribed<D: Database>(db: &D, address: &str) -> StoreResult<bool> {
    match db.get(&StoreKey::subscription(address).to_bytes()).await {
        Ok(_) => Ok(true),
        Err(DbError::NotFound) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn mark_subscribed<D: Database>(db: &D, address: &str) -> StoreResult<()> {
    db.set(&StoreKey::subscription(address).to_bytes(), Vec::new())
        .await?;
    Ok(())
}

/// Hash list for `address`, or `None` if the address was never subscribed.
pub(crate) async fn read_hash_list<D: Database>(
    db: &D,
    address: &str,
) -> StoreResult<Option<Vec<String>>> {
    match db.get(&StoreKey::address_transactions(address).to_bytes()).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(DbError::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn write_hash_list<D: Database>(
    db: &D,
    address: &str,
    hashes: &[String],
) -> StoreResult<()> {
    let bytes = serde_json::to_vec(hashes)?;
    db.set(&StoreKey::address_transactions(address).to_bytes(), bytes)
        .await?;
    Ok(())
}

pub(crate) async fn read_balances<D: Database>(db: &D) -> StoreResult<BalanceTable> {
    match db.get(&StoreKey::SubscribedAddresses.to_bytes()).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(DbError::NotFound) => Ok(BalanceTable::new()),
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn write_balances<D: Database>(db: &D, table: &BalanceTable) -> StoreResult<()> {
    let bytes = serde_json::to_vec(table)?;
    db.set(&StoreKey::SubscribedAddresses.to_bytes(), bytes).await?;
    Ok(())
}
