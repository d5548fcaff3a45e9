//! Relay engine for charon: scan a source chain, pack leaves, commit
//! hash-chained merkle roots to a destination chain.
//!
//! The moving parts:
//!
//! - [`chain`] - the `SourceChain` / `DestinationChain` seams this engine
//!   consumes (concrete RPC clients live outside this crate)
//! - [`codec`] - canonical leaf packing and the event-signature whitelist
//! - [`scanner`] - half-open block sweeps with bounded-backoff RPC retry
//! - [`relay`] - the cancellable scanner/submitter worker pair
//! - [`mock`] - scripted chains for tests and development
//!
//! One relay instance serves one `(source, destination)` pair and is the
//! sole writer of its ledger; run a second instance for the reverse
//! direction.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod chain;
pub mod codec;
pub mod errors;
pub mod mock;
pub mod relay;
pub mod retry;
pub mod scanner;

pub use chain::{
    DestinationChain, SourceBlock, SourceChain, SourceLog, SourceReceipt, SourceTransaction, TxId,
};
pub use codec::{
    leaf_for_transaction, pack_log, pack_transaction, EventFilter, DEFAULT_EVENT_PROTOTYPE,
};
pub use errors::{RelayError, Result};
pub use relay::{Relay, RelayConfig, RelayHandle, RelayStatus};
pub use retry::RetryPolicy;
pub use scanner::{ChainScanner, ScannedBlock};
