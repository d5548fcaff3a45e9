//! Merkle engine for the charon relay.
//!
//! Builds trees over ordered leaf sets and derives/verifies inclusion
//! proofs in the exact convention the destination chain's verifier checks:
//!
//! - level 0 is the sorted list of leaf hashes (flag bit cleared)
//! - odd levels are padded with the `merkle-tree-extra` sentinel
//! - proof entries carry their direction in the hash's reserved top bit
//!
//! These conventions are protocol constants shared with an on-chain
//! contract; change them only together with that contract.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod path;
pub mod tree;

#[cfg(test)]
mod proptest;

pub use path::{Direction, MerklePath, PathNode};
pub use tree::{padding_sentinel, MerkleTree};
