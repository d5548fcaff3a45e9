//! The append-only commitment ledger.
//!
//! The ledger owns every leaf the relay has ever produced plus the list of
//! checkpoints binding leaf-ledger prefixes to accepted destination-chain
//! commitments. Leaves only ever append; checkpoint leaf counts and block
//! ids are strictly increasing and partition the leaf index space. The
//! ledger never builds trees eagerly: construction is deferred to proof
//! time and rebuilt from whichever prefix a checkpoint names.

use serde::{Deserialize, Serialize};

use charon_core::{BlockId, Error, Leaf, Result};
use charon_merkle::MerkleTree;

use crate::store::LedgerStore;

/// Binding of a leaf-ledger prefix to an accepted destination commitment:
/// `leaves[0..leaf_count]` are exactly the set the commitment accepted as
/// `block_id` was computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Number of leaves covered by this checkpoint.
    pub leaf_count: usize,
    /// Destination-chain block identifier of the accepted commitment.
    pub block_id: BlockId,
    /// Unix timestamp of the submission.
    pub submitted_at: i64,
}

impl Checkpoint {
    /// Create a checkpoint stamped with the current time.
    pub fn new(leaf_count: usize, block_id: BlockId) -> Self {
        Self {
            leaf_count,
            block_id,
            submitted_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether this checkpoint covers the given leaf index.
    pub fn covers(&self, leaf_index: usize) -> bool {
        leaf_index < self.leaf_count
    }
}

/// Append-only leaf store plus monotonic checkpoint list.
pub struct CommitmentLedger<S> {
    store: S,
}

impl<S: LedgerStore> CommitmentLedger<S> {
    /// Create a ledger over a backing store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append leaves with their parallel transfer flags.
    ///
    /// Never builds a tree; roots are computed on demand by callers.
    pub fn append(&mut self, leaves: &[Leaf], flags: &[bool]) -> Result<()> {
        if leaves.len() != flags.len() {
            return Err(Error::internal(format!(
                "leaf/flag length mismatch: {} vs {}",
                leaves.len(),
                flags.len()
            )));
        }
        self.store.append_leaves(leaves, flags)
    }

    /// Total number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.store.leaf_count()
    }

    /// All leaves in append order.
    pub fn leaves(&self) -> Result<Vec<Leaf>> {
        self.store.leaf_prefix(self.store.leaf_count())
    }

    /// The leaf prefix bound to a checkpoint's commitment.
    pub fn leaves_for_checkpoint(&self, block_id: BlockId) -> Result<Vec<Leaf>> {
        let checkpoint = self.find_checkpoint(block_id)?;
        self.store.leaf_prefix(checkpoint.leaf_count)
    }

    /// Index of a leaf, by exact byte equality.
    pub fn leaf_index(&self, leaf: &Leaf) -> Result<usize> {
        self.store
            .leaf_index(leaf)?
            .ok_or_else(|| Error::leaf_not_found("unknown leaf"))
    }

    /// All transfer flags, index-aligned with the leaves.
    pub fn transfer_flags(&self) -> Result<Vec<bool>> {
        self.store.transfer_flags()
    }

    /// Record that `leaves[0..leaf_count]` were committed as `block_id`.
    ///
    /// Checkpoints append in strictly increasing order on both fields; a
    /// violation is a logic error that must never occur in a correctly
    /// sequenced relay.
    pub fn checkpoint(&mut self, leaf_count: usize, block_id: BlockId) -> Result<Checkpoint> {
        if leaf_count > self.store.leaf_count() {
            return Err(Error::internal(format!(
                "checkpoint covers {} leaves but only {} are stored",
                leaf_count,
                self.store.leaf_count()
            )));
        }

        if let Some(prev) = self.store.last_checkpoint()? {
            if leaf_count <= prev.leaf_count {
                return Err(Error::out_of_order_checkpoint(format!(
                    "leaf count {} not above previous {}",
                    leaf_count, prev.leaf_count
                )));
            }
            if block_id <= prev.block_id {
                return Err(Error::out_of_order_checkpoint(format!(
                    "block id {} not newer than previous {}",
                    block_id, prev.block_id
                )));
            }
        }

        let checkpoint = Checkpoint::new(leaf_count, block_id);
        self.store.push_checkpoint(checkpoint.clone())?;
        Ok(checkpoint)
    }

    /// All checkpoints in append order.
    pub fn checkpoints(&self) -> Result<Vec<Checkpoint>> {
        self.store.checkpoints()
    }

    /// The checkpoint recorded for a destination block id.
    pub fn find_checkpoint(&self, block_id: BlockId) -> Result<Checkpoint> {
        self.store
            .checkpoints()?
            .into_iter()
            .find(|c| c.block_id == block_id)
            .ok_or_else(|| Error::block_id_not_found(format!("unknown block id {}", block_id)))
    }

    /// The destination block id of the first checkpoint covering a leaf.
    ///
    /// Fails with `no committed checkpoint yet` when no checkpoint's prefix
    /// extends past the index.
    pub fn lookup_block_id(&self, leaf_index: usize) -> Result<BlockId> {
        self.store
            .checkpoints()?
            .into_iter()
            .find(|c| c.covers(leaf_index))
            .map(|c| c.block_id)
            .ok_or_else(Error::checkpoint_not_found)
    }

    /// Rebuild the merkle tree for a checkpoint's leaf prefix.
    ///
    /// Deliberately from scratch, O(n) per call: proof answers must be a
    /// pure function of the committed prefix.
    pub fn rebuild_tree_for_checkpoint(&self, block_id: BlockId) -> Result<MerkleTree> {
        let leaves = self.leaves_for_checkpoint(block_id)?;
        MerkleTree::build(&leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use charon_core::TX_LEAF_LEN;

    fn leaf(fill: u8) -> Leaf {
        Leaf::from_bytes(vec![fill; TX_LEAF_LEN]).unwrap()
    }

    fn ledger_with(leaves: &[Leaf]) -> CommitmentLedger<MemStore> {
        let mut ledger = CommitmentLedger::new(MemStore::new());
        let flags = vec![false; leaves.len()];
        ledger.append(leaves, &flags).unwrap();
        ledger
    }

    #[test]
    fn test_append_records_leaves_and_flags() {
        let mut ledger = CommitmentLedger::new(MemStore::new());
        ledger
            .append(&[leaf(1), leaf(2)], &[false, true])
            .unwrap();

        assert_eq!(ledger.leaf_count(), 2);
        assert_eq!(ledger.leaf_index(&leaf(2)).unwrap(), 1);
        assert_eq!(ledger.transfer_flags().unwrap(), vec![false, true]);
    }

    #[test]
    fn test_append_rejects_length_mismatch() {
        let mut ledger = CommitmentLedger::new(MemStore::new());
        assert!(ledger.append(&[leaf(1)], &[]).is_err());
    }

    #[test]
    fn test_unknown_leaf_fails() {
        let ledger = ledger_with(&[leaf(1)]);
        let err = ledger.leaf_index(&leaf(9)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_checkpoint_monotonicity() {
        let mut ledger = ledger_with(&[leaf(1), leaf(2), leaf(3), leaf(4)]);

        ledger.checkpoint(2, BlockId::new(10)).unwrap();

        // Equal leaf count fails.
        assert!(matches!(
            ledger.checkpoint(2, BlockId::new(11)).unwrap_err(),
            Error::OutOfOrderCheckpoint { .. }
        ));
        // Lower leaf count fails.
        assert!(matches!(
            ledger.checkpoint(1, BlockId::new(11)).unwrap_err(),
            Error::OutOfOrderCheckpoint { .. }
        ));
        // Stale block id fails.
        assert!(matches!(
            ledger.checkpoint(3, BlockId::new(10)).unwrap_err(),
            Error::OutOfOrderCheckpoint { .. }
        ));

        // Strictly newer on both fields succeeds.
        ledger.checkpoint(4, BlockId::new(11)).unwrap();
        assert_eq!(ledger.checkpoints().unwrap().len(), 2);
    }

    #[test]
    fn test_checkpoint_cannot_cover_unseen_leaves() {
        let mut ledger = ledger_with(&[leaf(1)]);
        assert!(ledger.checkpoint(5, BlockId::new(1)).is_err());
    }

    #[test]
    fn test_lookup_block_id_picks_first_covering_checkpoint() {
        let leaves: Vec<Leaf> = (1..=7).map(leaf).collect();
        let mut ledger = ledger_with(&leaves);

        ledger.checkpoint(4, BlockId::new(100)).unwrap();
        ledger.checkpoint(7, BlockId::new(101)).unwrap();

        assert_eq!(ledger.lookup_block_id(2).unwrap(), BlockId::new(100));
        assert_eq!(ledger.lookup_block_id(3).unwrap(), BlockId::new(100));
        assert_eq!(ledger.lookup_block_id(4).unwrap(), BlockId::new(101));
        assert_eq!(ledger.lookup_block_id(5).unwrap(), BlockId::new(101));
    }

    #[test]
    fn test_lookup_block_id_uncovered_leaf_fails() {
        let mut ledger = ledger_with(&[leaf(1), leaf(2)]);
        assert!(matches!(
            ledger.lookup_block_id(0).unwrap_err(),
            Error::NotFound { .. }
        ));

        ledger.checkpoint(1, BlockId::new(5)).unwrap();
        assert!(ledger.lookup_block_id(0).is_ok());
        // Index 1 sits above the only checkpoint.
        assert!(ledger.lookup_block_id(1).is_err());
    }

    #[test]
    fn test_rebuild_tree_matches_prefix() {
        let leaves: Vec<Leaf> = (1..=5).map(leaf).collect();
        let mut ledger = ledger_with(&leaves);
        ledger.checkpoint(3, BlockId::new(42)).unwrap();

        let tree = ledger.rebuild_tree_for_checkpoint(BlockId::new(42)).unwrap();
        let expected = MerkleTree::build(&leaves[..3]).unwrap();
        assert_eq!(tree.root(), expected.root());
    }

    #[test]
    fn test_rebuild_tree_unknown_block_id_fails() {
        let ledger = ledger_with(&[leaf(1)]);
        assert!(ledger.rebuild_tree_for_checkpoint(BlockId::new(9)).is_err());
    }

    #[test]
    fn test_proof_round_trip_through_checkpoint() {
        let leaves: Vec<Leaf> = (1..=6).map(leaf).collect();
        let mut ledger = ledger_with(&leaves);
        ledger.checkpoint(6, BlockId::new(3)).unwrap();

        let tree = ledger.rebuild_tree_for_checkpoint(BlockId::new(3)).unwrap();
        for l in &leaves {
            let path = tree.path(l).unwrap();
            assert!(path.verify(l, tree.root()));
        }
    }
}
