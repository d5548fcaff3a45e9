//! Merkle tree construction over an ordered leaf set.
//!
//! Level 0 is the sorted list of leaf hashes, so the tree shape is a pure
//! function of the leaf *set*: append order and batching never change the
//! root. Odd levels are padded with a fixed sentinel hash, keeping the tree
//! perfectly binary without revealing which position was padded (the
//! sentinel's preimage is public and constant).
//!
//! ```text
//! [ [ H(0), H(1), H(2), H(3) ]                level 0 (sorted)
//!   [ H(H(0)||H(1)), H(H(2)||H(3)) ]          level 1
//!   [ H(H(H(0)||H(1))||H(H(2)||H(3))) ] ]     level 2 (root)
//! ```

use once_cell::sync::Lazy;

use charon_core::{hash_pair, merkle_hash, Error, Hash, Leaf, Result};

use crate::path::{Direction, MerklePath, PathNode};

/// Preimage of the padding sentinel. Protocol constant; the destination
/// verifier is deployed against it.
const PADDING_INPUT: &[u8] = b"merkle-tree-extra";

static SENTINEL: Lazy<Hash> = Lazy::new(|| merkle_hash(PADDING_INPUT));

/// The fixed hash used to pad odd levels to an even node count.
pub fn padding_sentinel() -> Hash {
    *SENTINEL
}

/// A merkle tree over a leaf set: level 0 up to the single-node root level.
///
/// Derived, never persisted. Rebuilt on demand from any leaf prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree over the given leaves.
    ///
    /// Fails with [`Error::EmptyTree`] for an empty set; there is no zero
    /// root in this protocol.
    pub fn build(leaves: &[Leaf]) -> Result<Self> {
        if leaves.is_empty() {
            return Err(Error::empty_tree());
        }

        let mut current: Vec<Hash> = leaves.iter().map(|l| merkle_hash(l.as_bytes())).collect();
        current.sort();

        let mut levels = Vec::new();
        loop {
            // Pad after sorting: the sentinel sits at the end of the level,
            // not in sorted position.
            if current.len() % 2 != 0 {
                current.push(*SENTINEL);
            }
            let next: Vec<Hash> = current
                .chunks(2)
                .map(|pair| hash_pair(pair[0], pair[1]))
                .collect();
            levels.push(current);
            if next.len() == 1 {
                levels.push(next);
                break;
            }
            current = next;
        }

        Ok(Self { levels })
    }

    /// The root hash.
    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    /// Tree height: the number of fold steps from a leaf to the root,
    /// which is also the length of every inclusion path.
    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }

    /// Number of level-0 nodes, padding included.
    pub fn width(&self) -> usize {
        self.levels[0].len()
    }

    /// Build an inclusion path for a leaf.
    ///
    /// Fails with a leaf-not-present error when the leaf's hash is not in
    /// level 0. The sentinel padding sits after the sorted region, so the
    /// lookup is a linear scan rather than a binary search.
    pub fn path(&self, leaf: &Leaf) -> Result<MerklePath> {
        let target = merkle_hash(leaf.as_bytes());
        let mut idx = self.levels[0]
            .iter()
            .position(|h| *h == target)
            .ok_or_else(|| Error::leaf_not_found("leaf not present in tree"))?;

        let mut nodes = Vec::with_capacity(self.height());
        for level in &self.levels[..self.levels.len() - 1] {
            if idx % 2 == 0 {
                nodes.push(PathNode {
                    hash: level[idx + 1],
                    direction: Direction::Right,
                });
            } else {
                nodes.push(PathNode {
                    hash: level[idx - 1],
                    direction: Direction::Left,
                });
            }
            idx /= 2;
        }

        Ok(MerklePath::new(nodes))
    }
}
