//! Core types for charon, a Merkle-commitment relay between two chains.
//!
//! This crate provides the primitives shared by every other charon crate:
//!
//! - [`crypto`] - Keccak-256 hashing and the reserved direction-flag bit
//! - [`leaf`] - canonical packed leaf records and destination block ids
//! - [`error`] - the structured error taxonomy
//!
//! The hashing conventions here (flag bit, single primitive for leaves and
//! nodes) must match the destination chain's verifier bit for bit; they are
//! protocol, not implementation detail.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod crypto;
pub mod error;
pub mod leaf;

pub use crypto::{hash_pair, keccak, merkle_hash, Hash};
pub use error::{Error, ErrorCode, Result};
pub use leaf::{BlockId, Leaf, EVENT_LEAF_LEN, TX_LEAF_LEN};
