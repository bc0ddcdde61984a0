use crate::codec::{self, FormatError};
use crate::models::{Transaction, Transfer};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

/// Coin id of the chain's native coin.
pub const NATIVE_COIN_ID: i64 = 1;
pub const NATIVE_TICKER: &str = "ETH";

/// Block as returned by the node, numeric fields hex-encoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBlock {
    pub number: String,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: String,
    pub miner: String,
    pub gas_limit: String,
    pub gas_used: String,
    pub transactions: Vec<RawTransaction>,
}

/// Transaction as returned by the node. Absent or null fields deserialize empty
/// and then fail to decode, which scopes the failure to this transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTransaction {
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub tx_type: String,
    #[serde(deserialize_with = "nullable")]
    pub block_hash: String,
    #[serde(deserialize_with = "nullable")]
    pub block_number: String,
    #[serde(deserialize_with = "nullable")]
    pub from: String,
    #[serde(deserialize_with = "nullable")]
    pub gas: String,
    #[serde(deserialize_with = "nullable")]
    pub hash: String,
    #[serde(deserialize_with = "nullable")]
    pub input: String,
    #[serde(deserialize_with = "nullable")]
    pub nonce: String,
    pub to: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub transaction_index: String,
    #[serde(deserialize_with = "nullable")]
    pub value: String,
    #[serde(deserialize_with = "nullable")]
    pub gas_price: String,
    pub max_fee_per_gas: Option<String>,
    pub max_priority_fee_per_gas: Option<String>,
    pub chain_id: Option<String>,
}

fn nullable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to parse {field} of transaction {hash}: {source}")]
pub struct ParseFieldError {
    pub hash: String,
    pub field: &'static str,
    #[source]
    pub source: FormatError,
}

fn decode_field(raw: &RawTransaction, field: &'static str, value: &str) -> Result<BigUint, ParseFieldError> {
    codec::decode(value).map_err(|source| ParseFieldError {
        hash: raw.hash.clone(),
        field,
        source,
    })
}

/// Normalize a wire transaction into the canonical model.
///
/// Always yields exactly one native-coin transfer, possibly of zero value.
/// A missing or malformed chain id falls back to `default_chain_id`.
pub fn normalize_transaction(raw: &RawTransaction, default_chain_id: u64) -> Result<Transaction, ParseFieldError> {
    let tx_type = decode_field(raw, "type", &raw.tx_type)?;
    let block_number = decode_field(raw, "blockNumber", &raw.block_number)?;
    let value = decode_field(raw, "value", &raw.value)?;

    // Legacy transactions omit chainId.
    let chain_id = match raw.chain_id.as_deref().map(codec::decode) {
        Some(Ok(id)) => id,
        _ => {
            debug!("Transaction {} has no usable chain id, defaulting to {}", raw.hash, default_chain_id);
            BigUint::from(default_chain_id)
        }
    };

    let nonce = decode_field(raw, "nonce", &raw.nonce)?;
    let gas = decode_field(raw, "gas", &raw.gas)?;
    let gas_price = decode_field(raw, "gasPrice", &raw.gas_price)?;

    // Contract calls carry zero value but still get a transfer record.
    let transfers = vec![Transfer {
        coin_id: NATIVE_COIN_ID,
        ticker: NATIVE_TICKER.to_string(),
        from: raw.from.clone(),
        to: raw.to.clone(),
        value: value.clone(),
    }];

    Ok(Transaction {
        hash: raw.hash.clone(),
        tx_type,
        block_hash: raw.block_hash.clone(),
        block_number,
        from: raw.from.clone(),
        to: raw.to.clone(),
        value,
        input: raw.input.clone(),
        chain_id,
        nonce,
        gas,
        gas_price,
        transfers,
    })
}
