//! Chain seams consumed by the relay.
//!
//! The relay never talks JSON-RPC itself. It consumes a source chain behind
//! [`SourceChain`] (block/transaction/receipt queries returning raw hex
//! strings, decoded by the leaf codec) and a destination contract behind
//! [`DestinationChain`] (the hash-chained `update` commit plus history
//! accessors). Concrete clients implement these traits; [`crate::mock`]
//! provides scripted versions for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use charon_core::{BlockId, Hash};

use crate::errors::Result;

/// Transaction ID on a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub String);

impl TxId {
    /// Create a new transaction ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A source-chain block: the ordered transaction hashes it contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBlock {
    /// Block number.
    pub number: u64,
    /// Transaction hashes, in block order, hex-encoded.
    pub transactions: Vec<String>,
}

/// A source-chain transaction, fields as raw hex strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTransaction {
    /// Sender address.
    pub from: String,
    /// Recipient address; `None` for contract creations.
    pub to: Option<String>,
    /// Transferred value.
    pub value: String,
    /// Call data.
    pub input: String,
}

/// One log entry from a transaction receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceLog {
    /// Emitting contract address.
    pub address: String,
    /// Indexed topics; `topics[0]` is the event signature hash.
    pub topics: Vec<String>,
    /// Unindexed data.
    pub data: String,
}

/// A transaction receipt: the logs it emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReceipt {
    /// Emitted logs.
    pub logs: Vec<SourceLog>,
}

/// Read access to the chain being relayed from.
#[async_trait]
pub trait SourceChain: Send + Sync {
    /// Current chain head (highest block number).
    async fn block_number(&self) -> Result<u64>;

    /// Fetch a block by number.
    async fn block_by_number(&self, number: u64) -> Result<SourceBlock>;

    /// Fetch a transaction by hash.
    async fn transaction_by_hash(&self, hash: &str) -> Result<SourceTransaction>;

    /// Fetch a transaction's receipt.
    async fn transaction_receipt(&self, hash: &str) -> Result<SourceReceipt>;
}

/// The destination-chain commitment contract.
#[async_trait]
pub trait DestinationChain: Send + Sync {
    /// Submit a hash-chained commitment: the contract accepts
    /// `(prev_root, current_root)` only when `prev_root` matches its latest
    /// accepted root, binding every commitment to its predecessor.
    async fn update(&self, prev_root: Hash, current_root: Hash) -> Result<TxId>;

    /// The block id the contract assigned to its latest accepted commitment.
    async fn latest_block(&self) -> Result<BlockId>;

    /// The root committed at a block id.
    async fn root_at(&self, id: BlockId) -> Result<Hash>;

    /// The block id preceding the given one in the commitment chain.
    async fn previous_block(&self, id: BlockId) -> Result<BlockId>;
}
