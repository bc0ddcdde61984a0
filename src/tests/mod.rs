//! Shared fixtures for the async test suites.


use crate::blockchain::{ClientError, NodeClient, RawBlock, RawTransaction};
use crate::codec;
use crate::models::Transaction;
use async_trait::async_trait;
use num_traits::ToPrimitive;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const ALICE: &str = "0x29182006a4967e9a50c0a66076da514993d3b4d4";
pub const BOB: &str = "0x4838b106fce9647bdf1e7877bf73ce8b0bad5f97";
pub const CAROL: &str = "0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5";

pub fn raw_tx(hash: &str, height: u64, from: &str, to: &str, value: &str) -> RawTransaction {
    RawTransaction {
        hash: hash.to_string(),
        tx_type: "0x2".into(),
        block_hash: format!("0xblock{}", height),
        block_number: codec::encode_u64(height),
        chain_id: Some("0x1".into()),
        nonce: "0x0".into(),
        gas: "0x5208".into(),
        gas_price: "0x3b9aca00".into(),
        from: from.to_string(),
        to: Some(to.to_string()),
        value: value.to_string(),
        input: "0x".into(),
        ..Default::default()
    }
}

pub fn raw_block(height: u64, transactions: Vec<RawTransaction>) -> RawBlock {
    RawBlock {
        number: codec::encode_u64(height),
        hash: format!("0xblock{}", height),
        transactions,
        ..Default::default()
    }
}

pub fn sample_transaction(hash: &str, from: &str, to: &str) -> Transaction {
    crate::blockchain::normalize_transaction(&raw_tx(hash, 20_290_107, from, to, "0xa588ee0d2314c0"), 1)
        .expect("fixture normalizes")
}

/// Scripted in-process node.
#[derive(Default)]
pub struct MockNode {
    latest: AtomicU64,
    blocks: Mutex<BTreeMap<u64, RawBlock>>,
    fail_latest: AtomicUsize,
    fail_block: AtomicUsize,
    latest_requests: AtomicUsize,
    block_requests: Mutex<Vec<u64>>,
    latest_delay_ms: AtomicU64,
    block_delay_ms: AtomicU64,
}

impl MockNode {
    pub fn new(latest: u64) -> Self {
        let node = Self::default();
        node.latest.store(latest, Ordering::SeqCst);
        node
    }

    pub fn insert_block(&self, block: RawBlock) {
        let height = codec::decode(&block.number).unwrap().to_u64().unwrap();
        self.insert_block_at(height, block);
    }

    /// Serve `block` for requests at `height`, whatever its own number says.
    pub fn insert_block_at(&self, height: u64, block: RawBlock) {
        self.blocks.lock().unwrap().insert(height, block);
    }

    pub fn set_latest(&self, height: u64) {
        self.latest.store(height, Ordering::SeqCst);
    }

    /// Fail the next `n` latest-block requests.
    pub fn fail_latest_times(&self, n: usize) {
        self.fail_latest.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` block-by-number requests.
    pub fn fail_block_times(&self, n: usize) {
        self.fail_block.store(n, Ordering::SeqCst);
    }

    /// Hold every latest-block response for `delay`.
    pub fn delay_latest(&self, delay: Duration) {
        self.latest_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Hold every block-by-number response for `delay`.
    pub fn delay_blocks(&self, delay: Duration) {
        self.block_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn latest_requests(&self) -> usize {
        self.latest_requests.load(Ordering::SeqCst)
    }

    pub fn block_requests(&self) -> Vec<u64> {
        self.block_requests.lock().unwrap().clone()
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn pause(delay_ms: &AtomicU64) {
        let ms = delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn get_latest_block(&self) -> Result<RawBlock, ClientError> {
        self.latest_requests.fetch_add(1, Ordering::SeqCst);
        Self::pause(&self.latest_delay_ms).await;
        if Self::take_failure(&self.fail_latest) {
            return Err(ClientError::Decode("scripted latest failure".into()));
        }
        Ok(raw_block(self.latest.load(Ordering::SeqCst), Vec::new()))
    }

    async fn get_block_by_number(&self, height: u64) -> Result<RawBlock, ClientError> {
        self.block_requests.lock().unwrap().push(height);
        Self::pause(&self.block_delay_ms).await;
        if Self::take_failure(&self.fail_block) {
            return Err(ClientError::Decode("scripted block failure".into()));
        }
        Ok(self
            .blocks
            .lock()
            .unwrap()
            .get(&height)
            .cloned()
            .unwrap_or_else(|| raw_block(height, Vec::new())))
    }

    async fn get_transaction_by_hash(&self, hash: &str) -> Result<RawTransaction, ClientError> {
        self.blocks
            .lock()
            .unwrap()
            .values()
            .flat_map(|b| b.transactions.iter())
            .find(|tx| tx.hash == hash)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(hash.to_string()))
    }
}
