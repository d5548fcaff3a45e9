//! Inclusion paths and their verification.
//!
//! A path is the ordered list of sibling hashes from a leaf up to the root.
//! Each sibling carries a direction: with the sibling on the right the fold
//! is `H(running, sibling)`, on the left it is `H(sibling, running)`. On the
//! wire the direction travels inside the sibling hash itself: the reserved
//! top bit is set for right-hand siblings, which is why node hashes always
//! keep that bit cleared.

use charon_core::{hash_pair, merkle_hash, Error, Hash, Leaf, Result};

/// Side of the path the sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sibling is on the left: fold as `H(sibling, running)`.
    Left,
    /// Sibling is on the right: fold as `H(running, sibling)`.
    Right,
}

/// One sibling entry in an inclusion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathNode {
    /// The sibling's node hash, flag bit cleared.
    pub hash: Hash,
    /// Which side the sibling is on.
    pub direction: Direction,
}

impl PathNode {
    /// Encode into the wire form: the hash with the flag bit set for a
    /// right-hand sibling.
    pub fn to_tagged(&self) -> Hash {
        match self.direction {
            Direction::Right => self.hash.with_flag(),
            Direction::Left => self.hash,
        }
    }

    /// Decode from the wire form.
    pub fn from_tagged(tagged: Hash) -> Self {
        if tagged.is_flagged() {
            Self {
                hash: tagged.without_flag(),
                direction: Direction::Right,
            }
        } else {
            Self {
                hash: tagged,
                direction: Direction::Left,
            }
        }
    }
}

/// An inclusion path: sibling entries ordered leaf-to-root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerklePath {
    nodes: Vec<PathNode>,
}

impl MerklePath {
    /// Create a path from ordered entries.
    pub fn new(nodes: Vec<PathNode>) -> Self {
        Self { nodes }
    }

    /// The entries, leaf-to-root.
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    /// Number of entries (equals the tree height).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the path is empty. Never true for a path built by the
    /// engine: even a single-leaf tree folds once against the sentinel.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Verify that this path connects `leaf` to `root`.
    ///
    /// Recomputes the leaf hash and folds each entry per its direction;
    /// the result must match `root` bit for bit.
    pub fn verify(&self, leaf: &Leaf, root: Hash) -> bool {
        let mut node = merkle_hash(leaf.as_bytes());
        for entry in &self.nodes {
            node = match entry.direction {
                Direction::Right => hash_pair(node, entry.hash),
                Direction::Left => hash_pair(entry.hash, node),
            };
        }
        node == root
    }

    /// Encode as direction-tagged hashes (the wire form).
    pub fn to_tagged(&self) -> Vec<Hash> {
        self.nodes.iter().map(PathNode::to_tagged).collect()
    }

    /// Decode from direction-tagged hashes.
    pub fn from_tagged(tagged: Vec<Hash>) -> Self {
        Self {
            nodes: tagged.into_iter().map(PathNode::from_tagged).collect(),
        }
    }

    /// Encode as hex strings for the HTTP surface.
    pub fn to_hex_entries(&self) -> Vec<String> {
        self.to_tagged().iter().map(Hash::to_hex).collect()
    }

    /// Decode from hex strings.
    pub fn from_hex_entries(entries: &[String]) -> Result<Self> {
        let tagged = entries
            .iter()
            .map(|e| Hash::from_hex(e))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::invalid_proof(e.to_string()))?;
        Ok(Self::from_tagged(tagged))
    }
}
