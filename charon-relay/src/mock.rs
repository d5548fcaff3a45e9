//! Mock chains for testing and development.
//!
//! [`MockSourceChain`] serves scripted blocks, transactions, and receipts;
//! [`MockDestinationChain`] plays the commitment contract, enforcing the
//! same prev-root chaining rule the real verifier does so that relay
//! sequencing bugs surface in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use charon_core::{keccak, BlockId, Hash};
use charon_merkle::padding_sentinel;

use crate::chain::{
    DestinationChain, SourceBlock, SourceChain, SourceLog, SourceReceipt, SourceTransaction, TxId,
};
use crate::errors::{RelayError, Result};

/// Shape of a scripted transaction.
#[derive(Debug, Clone)]
pub struct TxSpec {
    kind: TxKind,
}

#[derive(Debug, Clone)]
enum TxKind {
    Plain,
    Creation,
    Event(String),
}

impl TxSpec {
    /// A value transfer with no qualifying event.
    pub fn plain() -> Self {
        Self { kind: TxKind::Plain }
    }

    /// A contract creation (no recipient); scanners skip these.
    pub fn creation() -> Self {
        Self {
            kind: TxKind::Creation,
        }
    }

    /// A transaction whose receipt carries a log matching `prototype`.
    pub fn with_event(prototype: &str) -> Self {
        Self {
            kind: TxKind::Event(prototype.to_string()),
        }
    }

    fn materialize(&self, n: u64) -> (SourceTransaction, SourceReceipt) {
        let mut from = [0u8; 20];
        from[12..].copy_from_slice(&n.to_be_bytes());
        let mut to = [0u8; 20];
        to[12..].copy_from_slice(&(n ^ 0xffff).to_be_bytes());

        let tx = SourceTransaction {
            from: format!("0x{}", hex::encode(from)),
            to: match self.kind {
                TxKind::Creation => None,
                _ => Some(format!("0x{}", hex::encode(to))),
            },
            value: format!("0x{:x}", n * 1000),
            input: "0x".to_string(),
        };

        let receipt = match &self.kind {
            TxKind::Event(prototype) => {
                let mut topic1 = [0u8; 32];
                topic1[24..].copy_from_slice(&n.to_be_bytes());
                let mut topic2 = [0u8; 32];
                topic2[24..].copy_from_slice(&n.wrapping_add(0x1000).to_be_bytes());

                SourceReceipt {
                    logs: vec![SourceLog {
                        address: format!("0x{}", hex::encode([0xcc; 20])),
                        topics: vec![
                            format!("0x{}", keccak(prototype.as_bytes()).to_hex()),
                            format!("0x{}", hex::encode(topic1)),
                            format!("0x{}", hex::encode(topic2)),
                        ],
                        data: "0x".to_string(),
                    }],
                }
            }
            _ => SourceReceipt { logs: vec![] },
        };

        (tx, receipt)
    }
}

#[derive(Default)]
struct SourceState {
    blocks: Vec<SourceBlock>,
    transactions: HashMap<String, SourceTransaction>,
    receipts: HashMap<String, SourceReceipt>,
    tx_counter: u64,
    fail_rpc: bool,
}

/// Scripted source chain. Block numbers start at 1.
#[derive(Default)]
pub struct MockSourceChain {
    state: RwLock<SourceState>,
}

impl MockSourceChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mine a block containing the given transactions; returns its number.
    pub fn push_block(&self, txs: Vec<TxSpec>) -> u64 {
        let mut state = self.state.write();
        let number = state.blocks.len() as u64 + 1;

        let mut hashes = Vec::with_capacity(txs.len());
        for spec in txs {
            state.tx_counter += 1;
            let n = state.tx_counter;
            let hash = format!("0x{:064x}", n);
            let (tx, receipt) = spec.materialize(n);
            state.transactions.insert(hash.clone(), tx);
            state.receipts.insert(hash.clone(), receipt);
            hashes.push(hash);
        }

        state.blocks.push(SourceBlock {
            number,
            transactions: hashes,
        });
        number
    }

    /// Toggle injected RPC failures.
    pub fn set_fail_rpc(&self, fail: bool) {
        self.state.write().fail_rpc = fail;
    }

    fn check_rpc(&self) -> Result<()> {
        if self.state.read().fail_rpc {
            Err(RelayError::Rpc("injected rpc failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SourceChain for MockSourceChain {
    async fn block_number(&self) -> Result<u64> {
        self.check_rpc()?;
        Ok(self.state.read().blocks.len() as u64)
    }

    async fn block_by_number(&self, number: u64) -> Result<SourceBlock> {
        self.check_rpc()?;
        self.state
            .read()
            .blocks
            .get(number.wrapping_sub(1) as usize)
            .cloned()
            .ok_or_else(|| RelayError::Rpc(format!("unknown block {}", number)))
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<SourceTransaction> {
        self.check_rpc()?;
        self.state
            .read()
            .transactions
            .get(hash)
            .cloned()
            .ok_or_else(|| RelayError::Rpc(format!("unknown transaction {}", hash)))
    }

    async fn transaction_receipt(&self, hash: &str) -> Result<SourceReceipt> {
        self.check_rpc()?;
        self.state
            .read()
            .receipts
            .get(hash)
            .cloned()
            .ok_or_else(|| RelayError::Rpc(format!("no receipt for {}", hash)))
    }
}

struct DestState {
    updates: Vec<(Hash, Hash)>,
    commits: Vec<(BlockId, Hash)>,
    fail_submit: bool,
}

/// Scripted destination contract.
///
/// Deployed "at genesis" with the padding sentinel as its root, like the
/// real contract, and rejects any `update` whose previous root does not
/// match its latest accepted one.
pub struct MockDestinationChain {
    state: RwLock<DestState>,
}

impl Default for MockDestinationChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDestinationChain {
    /// Create a contract with the genesis sentinel root.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DestState {
                updates: Vec::new(),
                commits: vec![(BlockId::new(0), padding_sentinel())],
                fail_submit: false,
            }),
        }
    }

    /// Toggle injected submission failures.
    pub fn set_fail_submit(&self, fail: bool) {
        self.state.write().fail_submit = fail;
    }

    /// Every `(prev_root, current_root)` pair accepted, in order.
    pub fn updates(&self) -> Vec<(Hash, Hash)> {
        self.state.read().updates.clone()
    }

    /// Block ids assigned to accepted commitments (genesis excluded).
    pub fn committed_block_ids(&self) -> Vec<BlockId> {
        self.state.read().commits[1..].iter().map(|(id, _)| *id).collect()
    }
}

#[async_trait]
impl DestinationChain for MockDestinationChain {
    async fn update(&self, prev_root: Hash, current_root: Hash) -> Result<TxId> {
        let mut state = self.state.write();
        if state.fail_submit {
            return Err(RelayError::SubmissionFailed("injected failure".into()));
        }

        let (_, latest_root) = state.commits[state.commits.len() - 1];
        if prev_root != latest_root {
            return Err(RelayError::SubmissionFailed(format!(
                "previous root mismatch: expected {}, got {}",
                latest_root, prev_root
            )));
        }

        state.updates.push((prev_root, current_root));
        let id = BlockId::new(state.commits.len() as u64);
        state.commits.push((id, current_root));
        Ok(TxId::new(format!("0x{:064x}", state.updates.len())))
    }

    async fn latest_block(&self) -> Result<BlockId> {
        let state = self.state.read();
        Ok(state.commits[state.commits.len() - 1].0)
    }

    async fn root_at(&self, id: BlockId) -> Result<Hash> {
        self.state
            .read()
            .commits
            .iter()
            .find(|(c, _)| *c == id)
            .map(|(_, root)| *root)
            .ok_or_else(|| RelayError::Rpc(format!("unknown block id {}", id)))
    }

    async fn previous_block(&self, id: BlockId) -> Result<BlockId> {
        let state = self.state.read();
        let idx = state
            .commits
            .iter()
            .position(|(c, _)| *c == id)
            .ok_or_else(|| RelayError::Rpc(format!("unknown block id {}", id)))?;
        if idx == 0 {
            return Err(RelayError::Rpc("genesis has no predecessor".into()));
        }
        Ok(state.commits[idx - 1].0)
    }
}
