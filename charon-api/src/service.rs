//! Read-only proof queries over the shared ledger.
//!
//! The service is the query surface an external withdrawal flow consults:
//! list the leaves a checkpoint committed, resolve a leaf to its covering
//! checkpoint, and build or check inclusion proofs. Reads take the ledger
//! lock briefly and never mutate; already-checkpointed prefixes are frozen
//! by the append-only contract, so concurrent relay writes cannot change
//! any answer derived from a checkpoint.

use std::sync::Arc;

use parking_lot::RwLock;

use charon_core::{BlockId, Leaf, Result};
use charon_ledger::{Checkpoint, CommitmentLedger, LedgerStore};
use charon_merkle::MerklePath;

/// Read-only query surface over the commitment ledger and merkle engine.
pub struct ProofService<S> {
    ledger: Arc<RwLock<CommitmentLedger<S>>>,
}

impl<S> Clone for ProofService<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

impl<S: LedgerStore> ProofService<S> {
    /// Create a service over a shared ledger.
    pub fn new(ledger: Arc<RwLock<CommitmentLedger<S>>>) -> Self {
        Self { ledger }
    }

    /// All leaves recorded so far.
    pub fn leaves(&self) -> Result<Vec<Leaf>> {
        self.ledger.read().leaves()
    }

    /// The leaf prefix a checkpoint committed.
    pub fn leaves_for_checkpoint(&self, block_id: BlockId) -> Result<Vec<Leaf>> {
        self.ledger.read().leaves_for_checkpoint(block_id)
    }

    /// All checkpoints in append order.
    pub fn checkpoints(&self) -> Result<Vec<Checkpoint>> {
        self.ledger.read().checkpoints()
    }

    /// The destination block id of the first checkpoint covering a leaf.
    pub fn lookup_block_id(&self, leaf: &Leaf) -> Result<BlockId> {
        let guard = self.ledger.read();
        let index = guard.leaf_index(leaf)?;
        guard.lookup_block_id(index)
    }

    /// Build an inclusion proof for a leaf against a checkpoint's root.
    ///
    /// Rebuilds the checkpoint-prefix tree from scratch; proof answers are
    /// a pure function of the committed prefix.
    pub fn proof(&self, leaf: &Leaf, block_id: BlockId) -> Result<MerklePath> {
        let tree = self.ledger.read().rebuild_tree_for_checkpoint(block_id)?;
        tree.path(leaf)
    }

    /// Check a proof against a checkpoint's root.
    ///
    /// A convenience mirror of the destination contract's own check, not an
    /// on-chain authority.
    pub fn verify(&self, leaf: &Leaf, path: &MerklePath, block_id: BlockId) -> Result<bool> {
        let tree = self.ledger.read().rebuild_tree_for_checkpoint(block_id)?;
        Ok(path.verify(leaf, tree.root()))
    }

    /// Total leaves recorded.
    pub fn leaf_count(&self) -> usize {
        self.ledger.read().leaf_count()
    }

    /// Total checkpoints recorded.
    pub fn checkpoint_count(&self) -> usize {
        self.ledger.read().checkpoints().map(|c| c.len()).unwrap_or(0)
    }
}
