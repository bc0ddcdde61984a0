//! Indexing engine: the block-polling state machine.
//!
//! One background task fetches the latest block, indexes the block after the
//! cursor, persists the cursor and waits. A failed fetch or store update backs
//! off for a fixed delay and retries the same block; nothing but [`Indexer::stop`]
//! ends the task.

use crate::blockchain::client::{ClientError, NodeClient};
use crate::blockchain::processor::{self, BlockSummary};
use crate::codec;
use crate::config::Config;
use crate::models::Transaction;
use crate::store::{Storage, StoreError};
use backon::{BackoffBuilder, ConstantBuilder};
use num_traits::ToPrimitive;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum PollError {
    #[error("node request failed: {0}")]
    Client(#[from] ClientError),

    #[error("store update failed: {0}")]
    Store(#[from] StoreError),
}

/// Engine state as observed from outside the background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    Idle = 0,
    Polling = 1,
    Backoff = 2,
    Stopped = 3,
}

impl From<u8> for EngineState {
    fn from(v: u8) -> Self {
        match v {
            0 => EngineState::Idle,
            1 => EngineState::Polling,
            2 => EngineState::Backoff,
            _ => EngineState::Stopped,
        }
    }
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The node has nothing past the cursor.
    UpToDate { latest: u64 },
    /// Block `height` was indexed and the cursor moved to it.
    Advanced { height: u64, summary: BlockSummary },
    /// Stop was requested after the latest-block fetch; nothing changed.
    Interrupted,
}

enum Lifecycle {
    Idle,
    Running(JoinHandle<()>),
    Stopped,
}

struct Shared {
    client: Arc<dyn NodeClient>,
    storage: Arc<dyn Storage>,
    // Next height to index; the last indexed block is one below.
    next: AtomicU64,
    state: AtomicU8,
    // Serializes cycles so `next` has a single writer.
    cycle: Mutex<()>,
    shutdown: CancellationToken,
    poll_interval: Duration,
    backoff_interval: Duration,
    chain_id: u64,
}

pub struct Indexer {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl Indexer {
    /// Build an engine. Indexing starts at `from_block` when configured,
    /// otherwise after the persisted height, otherwise after `default_from_block`.
    pub async fn new(
        config: &Config,
        client: Arc<dyn NodeClient>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, StoreError> {
        let next = match config.from_block {
            Some(from) => from,
            None => storage
                .get_indexed_block_number()
                .await?
                .unwrap_or(config.default_from_block)
                + 1,
        };
        info!("Indexer will start at block {}", next);

        Ok(Self {
            shared: Arc::new(Shared {
                client,
                storage,
                next: AtomicU64::new(next),
                state: AtomicU8::new(EngineState::Idle as u8),
                cycle: Mutex::new(()),
                shutdown: CancellationToken::new(),
                poll_interval: config.poll_interval,
                backoff_interval: config.backoff_interval,
                chain_id: config.chain_id,
            }),
            lifecycle: Mutex::new(Lifecycle::Idle),
        })
    }

    /// Spawn the polling task. Calling it again, or after [`Indexer::stop`], does nothing.
    pub async fn start(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if !matches!(*lifecycle, Lifecycle::Idle) {
            debug!("Indexer already started");
            return;
        }

        self.shared.set_state(EngineState::Polling);
        let shared = Arc::clone(&self.shared);
        *lifecycle = Lifecycle::Running(tokio::spawn(async move { shared.run().await }));
        info!("Indexer started");
    }

    /// Request shutdown and wait for the polling task to exit.
    ///
    /// A block being indexed when the request arrives is finished first.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        self.shared.shutdown.cancel();

        if let Lifecycle::Running(handle) = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            if let Err(e) = handle.await {
                error!("Indexer task terminated abnormally: {}", e);
            }
        }
        self.shared.set_state(EngineState::Stopped);
        info!("Indexer stopped at block {}", self.current_block());
    }

    /// Run a single poll cycle in the caller's task.
    pub async fn poll_once(&self) -> Result<CycleOutcome, PollError> {
        self.shared.poll_once().await
    }

    pub fn state(&self) -> EngineState {
        self.shared.state()
    }

    /// Height of the last fully indexed block.
    pub fn current_block(&self) -> u64 {
        self.shared.next.load(Ordering::Acquire).saturating_sub(1)
    }

    pub async fn subscribe_address(&self, address: &str) -> Result<(), StoreError> {
        self.shared.storage.subscribe_address(address).await
    }

    pub async fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, StoreError> {
        self.shared.storage.get_transactions_by_address(address).await
    }
}

// An engine dropped without `stop` still ends its task after the current cycle.
impl Drop for Indexer {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

impl Shared {
    fn state(&self) -> EngineState {
        EngineState::from(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: EngineState) {
        self.state.store(state as u8, Ordering::Release);
    }

    async fn run(&self) {
        let policy = ConstantBuilder::default()
            .with_delay(self.backoff_interval)
            .with_max_times(usize::MAX);
        let mut backoff = policy.clone().build();

        info!(
            "Polling from block {} every {:?}",
            self.next.load(Ordering::Acquire),
            self.poll_interval
        );

        loop {
            self.set_state(EngineState::Polling);
            let delay = match self.poll_once().await {
                Ok(CycleOutcome::Interrupted) => break,
                Ok(outcome) => {
                    if let CycleOutcome::Advanced { height, summary } = outcome {
                        info!(
                            "Indexed block {} ({} transactions, {} skipped, {} stored)",
                            height, summary.parsed, summary.skipped, summary.stored
                        );
                    }
                    backoff = policy.clone().build();
                    self.poll_interval
                }
                Err(e) => {
                    let delay = backoff.next().unwrap_or(self.backoff_interval);
                    warn!("Poll cycle failed: {}. Retry in {:?}", e, delay);
                    self.set_state(EngineState::Backoff);
                    delay
                }
            };

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }

        info!("Shutting down indexer polling");
    }

    async fn poll_once(&self) -> Result<CycleOutcome, PollError> {
        let _cycle = self.cycle.lock().await;

        let latest = self.client.get_latest_block().await?;
        let latest = parse_height(&latest.number)?;

        if self.shutdown.is_cancelled() {
            return Ok(CycleOutcome::Interrupted);
        }

        let next = self.next.load(Ordering::Acquire);
        if latest < next {
            debug!("Latest block {} already indexed (next {})", latest, next);
            return Ok(CycleOutcome::UpToDate { latest });
        }

        let block = self.client.get_block_by_number(next).await?;
        let number = parse_height(&block.number)?;
        if number != next {
            return Err(ClientError::Decode(format!("requested block {} but node returned {}", next, number)).into());
        }

        let summary = processor::process_block(self.storage.as_ref(), &block, self.chain_id).await?;

        // Persist before publishing so a failed write retries the same block.
        self.storage.save_indexed_block_number(next).await?;
        self.next.store(next + 1, Ordering::Release);

        Ok(CycleOutcome::Advanced { height: next, summary })
    }
}

fn parse_height(hex: &str) -> Result<u64, ClientError> {
    codec::decode(hex)
        .map_err(|e| ClientError::Decode(format!("block number: {}", e)))?
        .to_u64()
        .ok_or_else(|| ClientError::Decode(format!("block number out of range: {}", hex)))
}
