// Configuration for:
// - Node RPC endpoint and per-phase timeouts
// - Starting block / persisted cursor fallback
// - Poll and backoff cadence
// - Storage backend (in-memory unless DATABASE_URL is set)

use dotenv::dotenv;
use std::env;
use std::time::Duration;

/// Cursor used when neither `FROM_BLOCK` nor a persisted height is available.
pub const DEFAULT_FROM_BLOCK: u64 = 15_537_393;

/// Ethereum mainnet.
pub const MAINNET_CHAIN_ID: u64 = 1;

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub from_block: Option<u64>,
    pub default_from_block: u64,
    pub poll_interval: Duration,
    pub backoff_interval: Duration,
    pub rpc_connect_timeout: Duration,
    pub rpc_read_timeout: Duration,
    pub rpc_timeout: Duration,
    pub chain_id: u64,
    pub database_url: Option<String>,
    pub subscribe_addresses: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "https://cloudflare-eth.com".to_string(),
            from_block: None,
            default_from_block: DEFAULT_FROM_BLOCK,
            poll_interval: Duration::from_secs(15),
            backoff_interval: Duration::from_secs(10),
            rpc_connect_timeout: Duration::from_secs(5),
            rpc_read_timeout: Duration::from_secs(5),
            rpc_timeout: Duration::from_secs(10),
            chain_id: MAINNET_CHAIN_ID,
            database_url: None,
            subscribe_addresses: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        let rpc_url = env::var("ETH_RPC_URL").unwrap_or(defaults.rpc_url);
        let from_block = env::var("FROM_BLOCK").ok().and_then(|v| v.parse().ok());
        let default_from_block = env::var("DEFAULT_FROM_BLOCK")
            .map(|v| v.parse().unwrap_or(DEFAULT_FROM_BLOCK))
            .unwrap_or(DEFAULT_FROM_BLOCK);
        let chain_id = env::var("CHAIN_ID")
            .map(|v| v.parse().unwrap_or(MAINNET_CHAIN_ID))
            .unwrap_or(MAINNET_CHAIN_ID);
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let subscribe_addresses = env::var("SUBSCRIBE_ADDRESSES")
            .map(|v| parse_address_list(&v))
            .unwrap_or_default();

        Self {
            rpc_url,
            from_block,
            default_from_block,
            poll_interval: secs_var("POLL_INTERVAL_SECS", defaults.poll_interval),
            backoff_interval: secs_var("BACKOFF_INTERVAL_SECS", defaults.backoff_interval),
            rpc_connect_timeout: secs_var("RPC_CONNECT_TIMEOUT_SECS", defaults.rpc_connect_timeout),
            rpc_read_timeout: secs_var("RPC_READ_TIMEOUT_SECS", defaults.rpc_read_timeout),
            rpc_timeout: secs_var("RPC_TIMEOUT_SECS", defaults.rpc_timeout),
            chain_id,
            database_url,
            subscribe_addresses,
        }
    }
}

fn secs_var(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Split a comma separated address list, lowercasing each entry.
pub fn parse_address_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect()
}
