//! The relay worker: scan, append, commit, checkpoint.
//!
//! Two cooperating tasks joined by a bounded channel:
//!
//! - the **scanner task** polls the source chain and sends each scanned
//!   block downstream in block order;
//! - the **submitter task** is the sole ledger writer: it appends leaves,
//!   computes the root over leaves-so-far, accumulates batch entries, and on
//!   flush submits `Update(prev_root, root)` for every entry that carried a
//!   whitelisted event, checkpointing each accepted commitment.
//!
//! Roots submit in block order and `prev_root` always advances to the last
//! accepted root, so destination commitments form one linked sequence.
//! Cancellation is a shared `watch` flag observed once per tick; `stop`
//! latency is bounded by one poll interval plus one submission round trip.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use charon_core::Hash;
use charon_ledger::{CommitmentLedger, LedgerStore};
use charon_merkle::{padding_sentinel, MerkleTree};

use crate::chain::{DestinationChain, SourceChain};
use crate::errors::{RelayError, Result};
use crate::scanner::{ChainScanner, ScannedBlock};

/// Relay configuration. Batch size and poll interval are the only tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Batch entries accumulated before a submission flush.
    pub batch_size: usize,
    /// Sleep between scan ticks when the chain has no new blocks.
    #[serde(with = "duration_serde")]
    pub poll_interval: Duration,
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// One accumulated commitment: the root over leaves-so-far after a block
/// group was appended, with the ledger length that root was computed over.
#[derive(Debug, Clone)]
struct BatchEntry {
    block_number: u64,
    root: Hash,
    has_transfer: bool,
    leaf_count: usize,
}

/// Observable relay state.
#[derive(Debug, Default)]
pub struct RelayStatus {
    running: AtomicBool,
    last_scanned: AtomicU64,
}

impl RelayStatus {
    /// Whether the worker tasks are live.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// The scanner's next block to process.
    pub fn last_scanned(&self) -> u64 {
        self.last_scanned.load(Ordering::Relaxed)
    }
}

/// The relay worker pair.
pub struct Relay;

impl Relay {
    /// Start the relay over the given chains and ledger.
    ///
    /// Returns immediately; the work happens on spawned tasks until a fatal
    /// error or [`RelayHandle::stop`].
    pub fn spawn<C, D, S>(
        scanner: ChainScanner<C>,
        destination: Arc<D>,
        ledger: Arc<RwLock<CommitmentLedger<S>>>,
        config: RelayConfig,
    ) -> RelayHandle
    where
        C: SourceChain + 'static,
        D: DestinationChain + 'static,
        S: LedgerStore + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (block_tx, block_rx) = mpsc::channel(config.batch_size.max(1) * 2);
        let status = Arc::new(RelayStatus {
            running: AtomicBool::new(true),
            last_scanned: AtomicU64::new(scanner.last_scanned()),
        });

        let scanner_task = tokio::spawn(scan_loop(
            scanner,
            block_tx,
            shutdown_rx,
            config.poll_interval,
            status.clone(),
        ));

        let submitter_task = tokio::spawn({
            let status = status.clone();
            let batch_size = config.batch_size;
            async move {
                if let Err(e) = submit_loop(block_rx, destination, ledger, batch_size).await {
                    error!("relay submitter stopped on error: {e}");
                }
                status.running.store(false, Ordering::Relaxed);
            }
        });

        RelayHandle {
            shutdown: shutdown_tx,
            scanner_task,
            submitter_task,
            status,
        }
    }
}

/// Handle to a running relay.
pub struct RelayHandle {
    shutdown: watch::Sender<bool>,
    scanner_task: JoinHandle<()>,
    submitter_task: JoinHandle<()>,
    status: Arc<RelayStatus>,
}

impl RelayHandle {
    /// Observable relay state.
    pub fn status(&self) -> Arc<RelayStatus> {
        self.status.clone()
    }

    /// Request cooperative shutdown and join both workers.
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.scanner_task
            .await
            .map_err(|e| RelayError::Internal(format!("scanner task panicked: {e}")))?;
        self.submitter_task
            .await
            .map_err(|e| RelayError::Internal(format!("submitter task panicked: {e}")))?;
        Ok(())
    }
}

/// Sleep for `interval`, returning early (false) on shutdown.
async fn sleep_or_shutdown(interval: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(interval) => true,
        _ = shutdown.changed() => false,
    }
}

async fn scan_loop<C: SourceChain>(
    mut scanner: ChainScanner<C>,
    tx: mpsc::Sender<ScannedBlock>,
    mut shutdown: watch::Receiver<bool>,
    poll_interval: Duration,
    status: Arc<RelayStatus>,
) {
    info!(start = scanner.last_scanned(), "relay scanner started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        match scanner.scan_once().await {
            Ok(blocks) => {
                status
                    .last_scanned
                    .store(scanner.last_scanned(), Ordering::Relaxed);

                if blocks.is_empty() {
                    if !sleep_or_shutdown(poll_interval, &mut shutdown).await {
                        break;
                    }
                    continue;
                }

                for block in blocks {
                    if tx.send(block).await.is_err() {
                        warn!("submitter gone; stopping scanner");
                        return;
                    }
                }
            }
            Err(e) => {
                // The cursor did not advance; the next tick re-covers the
                // same range.
                warn!(from = scanner.last_scanned(), "scan tick failed: {e}");
                if !sleep_or_shutdown(poll_interval, &mut shutdown).await {
                    break;
                }
            }
        }
    }

    info!("relay scanner stopped");
    // Dropping `tx` closes the channel; the submitter drains and exits.
}

async fn submit_loop<D, S>(
    mut rx: mpsc::Receiver<ScannedBlock>,
    destination: Arc<D>,
    ledger: Arc<RwLock<CommitmentLedger<S>>>,
    batch_size: usize,
) -> Result<()>
where
    D: DestinationChain,
    S: LedgerStore,
{
    let mut prev_root = padding_sentinel();
    let mut batch: Vec<BatchEntry> = Vec::new();

    while let Some(block) = rx.recv().await {
        if !block.leaves.is_empty() {
            let (root, leaf_count) = {
                let mut guard = ledger.write();
                guard.append(&block.leaves, &block.transfer_flags)?;
                let leaves = guard.leaves()?;
                (MerkleTree::build(&leaves)?.root(), guard.leaf_count())
            };

            batch.push(BatchEntry {
                block_number: block.number,
                root,
                has_transfer: block.has_transfer(),
                leaf_count,
            });
        }

        if !batch.is_empty() && (block.is_latest || batch.len() >= batch_size) {
            prev_root = submit_batch(destination.as_ref(), &ledger, &mut batch, prev_root).await?;
        }
    }

    // Scanner stopped; flush so the final partial batch is never stranded.
    if !batch.is_empty() {
        submit_batch(destination.as_ref(), &ledger, &mut batch, prev_root).await?;
    }

    Ok(())
}

/// Submit every batch entry that carried a whitelisted event, chaining each
/// root to its predecessor, and checkpoint the accepted commitments.
async fn submit_batch<D, S>(
    destination: &D,
    ledger: &Arc<RwLock<CommitmentLedger<S>>>,
    batch: &mut Vec<BatchEntry>,
    mut prev_root: Hash,
) -> Result<Hash>
where
    D: DestinationChain,
    S: LedgerStore,
{
    info!(entries = batch.len(), "submitting batch");

    for entry in batch.iter().filter(|e| e.has_transfer) {
        let tx_id = destination.update(prev_root, entry.root).await?;
        let block_id = destination.latest_block().await?;
        ledger.write().checkpoint(entry.leaf_count, block_id)?;
        info!(
            block = entry.block_number,
            leaf_count = entry.leaf_count,
            tx = %tx_id,
            block_id = %block_id,
            "committed root"
        );
        prev_root = entry.root;
    }

    batch.clear();
    Ok(prev_root)
}
