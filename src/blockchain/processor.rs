use crate::blockchain::models::{normalize_transaction, RawBlock};
use crate::models::Transaction;
use crate::store::{Storage, StoreError};
use tracing::{debug, info, warn};

/// Outcome of indexing one block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockSummary {
    pub parsed: usize,
    pub skipped: usize,
    pub stored: usize,
}

/// Normalize every transaction in `block` and route it to subscribed participants.
///
/// Parse failures skip the offending transaction only. Store failures abort the
/// block so the caller can retry it; stores are idempotent, so re-running a
/// partially routed block is safe.
pub async fn process_block<S: Storage + ?Sized>(
    storage: &S,
    block: &RawBlock,
    default_chain_id: u64,
) -> Result<BlockSummary, StoreError> {
    let mut summary = BlockSummary::default();

    for raw in &block.transactions {
        let tx = match normalize_transaction(raw, default_chain_id) {
            Ok(tx) => tx,
            Err(e) => {
                warn!("Skipping transaction: {}", e);
                summary.skipped += 1;
                continue;
            }
        };
        summary.parsed += 1;
        summary.stored += save_subscribed_address_transaction(storage, &tx).await?;
    }

    debug!(
        "Block {}: parsed {}, skipped {}, stored {}",
        block.number, summary.parsed, summary.skipped, summary.stored
    );
    Ok(summary)
}

/// Store `tx` for each distinct subscribed sender or recipient. Returns how many
/// (address, transaction) pairs were routed.
pub async fn save_subscribed_address_transaction<S: Storage + ?Sized>(
    storage: &S,
    tx: &Transaction,
) -> Result<usize, StoreError> {
    let mut routed = 0;
    let mut seen: Vec<&str> = Vec::new();

    for address in tx.participants() {
        // Self-transfers name the same address twice.
        if seen.contains(&address) {
            continue;
        }
        seen.push(address);

        if !storage.is_subscribed_address(address).await? {
            continue;
        }
        storage.add_address_transaction(address, tx).await?;
        info!("Saved transaction for subscribed address: {} hash: {}", address, tx.hash);
        routed += 1;
    }

    Ok(routed)
}
