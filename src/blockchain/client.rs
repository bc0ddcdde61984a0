use crate::blockchain::models::{RawBlock, RawTransaction};
use crate::codec;
use crate::config::Config;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transaction not found: {0}")]
    NotFound(String),
}

/// Node calls the indexing engine depends on.
///
/// Each call is a single request/response cycle; implementations never retry.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Latest block, transaction bodies inline.
    async fn get_latest_block(&self) -> Result<RawBlock, ClientError>;

    /// Block at `height`, transaction bodies inline.
    async fn get_block_by_number(&self, height: u64) -> Result<RawBlock, ClientError>;

    async fn get_transaction_by_hash(&self, hash: &str) -> Result<RawTransaction, ClientError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

/// JSON-RPC client over HTTP.
pub struct HttpNodeClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpNodeClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        info!(
            "Initializing node client with RPC endpoint: {}, connect timeout: {:?}, read timeout: {:?}",
            config.rpc_url, config.rpc_connect_timeout, config.rpc_read_timeout
        );

        // connect_timeout spans TCP connect and TLS handshake; read_timeout bounds the
        // wait for response headers; timeout caps the whole exchange.
        let http = reqwest::Client::builder()
            .connect_timeout(config.rpc_connect_timeout)
            .read_timeout(config.rpc_read_timeout)
            .timeout(config.rpc_timeout)
            .build()?;

        Ok(Self {
            http,
            url: config.rpc_url.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("RPC request {} {}", method, params);

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?;

        let envelope: RpcResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Decode(format!("{} response: {}", method, e)))?;
        if let Some(err) = envelope.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        match envelope.result {
            None | Some(Value::Null) => Ok(None),
            Some(result) => serde_json::from_value(result)
                .map(Some)
                .map_err(|e| ClientError::Decode(format!("{} result: {}", method, e))),
        }
    }

    async fn get_block(&self, tag: String) -> Result<RawBlock, ClientError> {
        self.call("eth_getBlockByNumber", json!([tag, true]))
            .await?
            .ok_or_else(|| ClientError::Decode(format!("no block returned for {}", tag)))
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn get_latest_block(&self) -> Result<RawBlock, ClientError> {
        self.get_block("latest".to_string()).await
    }

    async fn get_block_by_number(&self, height: u64) -> Result<RawBlock, ClientError> {
        self.get_block(codec::encode_u64(height)).await
    }

    async fn get_transaction_by_hash(&self, hash: &str) -> Result<RawTransaction, ClientError> {
        self.call("eth_getTransactionByHash", json!([hash]))
            .await?
            .ok_or_else(|| ClientError::NotFound(hash.to_string()))
    }
}
