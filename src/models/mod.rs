// Canonical transaction model produced by the normalizer and persisted by the store.

use crate::codec::serde_hex;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// One value movement within a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    /// Coin identifier within the chain (the native coin is always 1).
    pub coin_id: i64,
    pub ticker: String,
    pub from: String,
    pub to: Option<String>,
    #[serde(with = "serde_hex")]
    pub value: BigUint,
}

/// A normalized transaction, immutable once created and keyed by `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    #[serde(with = "serde_hex")]
    pub tx_type: BigUint,
    pub block_hash: String,
    #[serde(with = "serde_hex")]
    pub block_number: BigUint,
    pub from: String,
    /// `None` for contract creations.
    pub to: Option<String>,
    #[serde(with = "serde_hex")]
    pub value: BigUint,
    pub input: String,
    #[serde(with = "serde_hex")]
    pub chain_id: BigUint,
    #[serde(with = "serde_hex")]
    pub nonce: BigUint,
    #[serde(with = "serde_hex")]
    pub gas: BigUint,
    #[serde(with = "serde_hex")]
    pub gas_price: BigUint,
    pub transfers: Vec<Transfer>,
}

impl Transaction {
    /// Every address that sends or receives value in this transaction, in transfer order.
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.transfers
            .iter()
            .flat_map(|t| std::iter::once(t.from.as_str()).chain(t.to.as_deref()))
    }
}
