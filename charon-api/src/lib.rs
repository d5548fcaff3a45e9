//! Proof-serving HTTP API for the charon relay.
//!
//! A read-only JSON surface over the commitment ledger and merkle engine,
//! consumed by external withdrawal/settlement flows that need the leaves,
//! checkpoints, and inclusion proofs behind an on-chain commitment. The
//! relay worker is the only writer of the underlying ledger; this crate
//! only ever reads it.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod rest;
pub mod server;
pub mod service;

pub use rest::{create_router, ApiError};
pub use server::{ApiConfig, ApiServer, ApiState};
pub use service::ProofService;
