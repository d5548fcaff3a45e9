//! Source-chain scanner.
//!
//! Tracks the last scanned block and, per tick, sweeps the half-open range
//! `[last_scanned, head)` where `head` is one past the chain tip at poll
//! time. The highest block of a sweep is tagged `is_latest` only when it is
//! truly current, which is what lets the relay flush a partial batch instead
//! of stranding it. `last_scanned` advances only after the whole tick
//! decodes cleanly; a failed tick retries the identical range, and leaf
//! packing is deterministic, so replays are byte-identical.

use std::sync::Arc;

use tracing::debug;

use charon_core::Leaf;

use crate::chain::SourceChain;
use crate::codec::{leaf_for_transaction, EventFilter};
use crate::errors::Result;
use crate::retry::RetryPolicy;

/// One scanned block: its leaves in transaction order plus the parallel
/// transfer flags.
#[derive(Debug, Clone)]
pub struct ScannedBlock {
    /// Source-chain block number.
    pub number: u64,
    /// One leaf per non-creation transaction, in block order.
    pub leaves: Vec<Leaf>,
    /// Whether each leaf position carried a whitelisted event.
    pub transfer_flags: Vec<bool>,
    /// Whether this was the chain tip at poll time.
    pub is_latest: bool,
}

impl ScannedBlock {
    /// Whether any transaction in this block carried a whitelisted event.
    pub fn has_transfer(&self) -> bool {
        self.transfer_flags.iter().any(|f| *f)
    }
}

/// Polls the source chain and extracts leaves.
pub struct ChainScanner<C> {
    source: Arc<C>,
    filter: EventFilter,
    retry: RetryPolicy,
    last_scanned: u64,
}

impl<C: SourceChain> ChainScanner<C> {
    /// Create a scanner starting at `start_block` (inclusive).
    pub fn new(source: Arc<C>, filter: EventFilter, start_block: u64) -> Self {
        Self {
            source,
            filter,
            retry: RetryPolicy::default(),
            last_scanned: start_block,
        }
    }

    /// Replace the RPC retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The next block the scanner will process.
    pub fn last_scanned(&self) -> u64 {
        self.last_scanned
    }

    /// One scan tick.
    ///
    /// Returns an empty vector when the chain has no new blocks. Any RPC or
    /// decode failure aborts the tick without advancing `last_scanned`.
    pub async fn scan_once(&mut self) -> Result<Vec<ScannedBlock>> {
        let source = Arc::clone(&self.source);
        let head = self
            .retry
            .run(|| {
                let source = Arc::clone(&source);
                async move { source.block_number().await }
            })
            .await?
            + 1;
        if head <= self.last_scanned {
            return Ok(Vec::new());
        }

        debug!(
            from = self.last_scanned,
            to = head - 1,
            "scanning block range"
        );

        let mut scanned = Vec::with_capacity((head - self.last_scanned) as usize);
        for number in self.last_scanned..head {
            scanned.push(self.process_block(number, number == head - 1).await?);
        }

        // The whole range decoded; only now does the cursor move.
        self.last_scanned = head;
        Ok(scanned)
    }

    async fn process_block(&self, number: u64, is_latest: bool) -> Result<ScannedBlock> {
        let source = Arc::clone(&self.source);
        let block = self
            .retry
            .run(|| {
                let source = Arc::clone(&source);
                async move { source.block_by_number(number).await }
            })
            .await?;

        let mut leaves = Vec::with_capacity(block.transactions.len());
        let mut transfer_flags = Vec::with_capacity(block.transactions.len());

        for tx_hash in &block.transactions {
            let tx = self
                .retry
                .run(|| {
                    let source = Arc::clone(&source);
                    let hash = tx_hash.clone();
                    async move { source.transaction_by_hash(&hash).await }
                })
                .await?;

            // Contract creations have no recipient and produce no leaf.
            if tx.to.is_none() {
                continue;
            }

            let receipt = self
                .retry
                .run(|| {
                    let source = Arc::clone(&source);
                    let hash = tx_hash.clone();
                    async move { source.transaction_receipt(&hash).await }
                })
                .await?;

            let (leaf, transfer) = leaf_for_transaction(&tx, &receipt, &self.filter)?;
            leaves.push(leaf);
            transfer_flags.push(transfer);
        }

        Ok(ScannedBlock {
            number,
            leaves,
            transfer_flags,
            is_latest,
        })
    }
}
