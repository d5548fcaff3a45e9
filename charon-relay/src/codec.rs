//! Leaf codec: canonical packing of transactions and event logs.
//!
//! Two record shapes, both deterministic functions of chain data:
//!
//! - transaction form: `sender(20) || recipient(20) || value(32 BE) || keccak(input)`
//! - event form: `sender(20) || recipient(20) || log address(20) || topic1(32) || topic2(32)`
//!
//! The event form replaces the transaction form when the receipt carries a
//! log whose `topics[0]` matches the configured signature whitelist.
//! Malformed hex or missing fields are decode errors and abort the current
//! scan tick; nothing is silently skipped.

use charon_core::{keccak, Error, Hash, Leaf};

use crate::chain::{SourceLog, SourceReceipt, SourceTransaction};
use crate::errors::Result;

/// Event prototype matched by the default filter.
pub const DEFAULT_EVENT_PROTOTYPE: &str = "LockTransfer(address,address,uint256,bytes32,bytes)";

/// Whitelist of event signatures whose logs are packed in event form.
///
/// Entries are the keccak-256 digests of event prototype strings, the same
/// value a chain places in `topics[0]`.
#[derive(Debug, Clone)]
pub struct EventFilter {
    signatures: Vec<Hash>,
}

impl EventFilter {
    /// Build a filter from event prototype strings.
    pub fn from_prototypes(prototypes: &[&str]) -> Self {
        Self {
            signatures: prototypes.iter().map(|p| keccak(p.as_bytes())).collect(),
        }
    }

    /// Build a filter from precomputed signature hashes.
    pub fn from_signatures(signatures: Vec<Hash>) -> Self {
        Self { signatures }
    }

    /// Whether a log's `topics[0]` matches the whitelist.
    pub fn matches(&self, topic0: &str) -> Result<bool> {
        let sig = Hash::from_hex(topic0)
            .map_err(|e| Error::decode_field("topics[0]", e.to_string()))?;
        Ok(self.signatures.contains(&sig))
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::from_prototypes(&[DEFAULT_EVENT_PROTOTYPE])
    }
}

/// Decode a hex field, tolerating a `0x` prefix and odd digit counts
/// (odd-length values are numeric and get a leading zero digit).
fn decode_hex_field(field: &str, value: &str) -> Result<Vec<u8>> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    let padded;
    let digits = if stripped.len() % 2 != 0 {
        padded = format!("0{}", stripped);
        &padded
    } else {
        stripped
    };
    hex::decode(digits)
        .map_err(|e| Error::decode_field(field, e.to_string()))
        .map_err(Into::into)
}

/// Decode a 20-byte address field.
fn decode_address(field: &str, value: &str) -> Result<[u8; 20]> {
    let bytes = decode_hex_field(field, value)?;
    bytes
        .try_into()
        .map_err(|_| Error::decode_field(field, "expected 20 bytes").into())
}

/// Decode a 32-byte word field (an indexed log topic).
fn decode_word(field: &str, value: &str) -> Result<[u8; 32]> {
    let bytes = decode_hex_field(field, value)?;
    bytes
        .try_into()
        .map_err(|_| Error::decode_field(field, "expected 32 bytes").into())
}

/// Decode a numeric hex field into a 32-byte big-endian value.
fn decode_amount(field: &str, value: &str) -> Result<[u8; 32]> {
    let bytes = decode_hex_field(field, value)?;
    if bytes.len() > 32 {
        return Err(Error::decode_field(field, "value wider than 256 bits").into());
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

/// Pack a transaction into its canonical leaf form.
///
/// Contract creations carry no recipient and cannot be packed; the scanner
/// skips them before reaching this point.
pub fn pack_transaction(tx: &SourceTransaction) -> Result<Leaf> {
    let to = tx
        .to
        .as_deref()
        .ok_or_else(|| Error::decode_field("to", "contract creation has no recipient"))?;

    let from = decode_address("from", &tx.from)?;
    let to = decode_address("to", to)?;
    let value = decode_amount("value", &tx.value)?;
    let input = decode_hex_field("input", &tx.input)?;

    let mut bytes = Vec::with_capacity(charon_core::TX_LEAF_LEN);
    bytes.extend_from_slice(&from);
    bytes.extend_from_slice(&to);
    bytes.extend_from_slice(&value);
    bytes.extend_from_slice(keccak(&input).as_bytes());

    Ok(Leaf::from_bytes(bytes)?)
}

/// Pack a whitelisted event log into its canonical leaf form.
pub fn pack_log(tx: &SourceTransaction, log: &SourceLog) -> Result<Leaf> {
    let to = tx
        .to
        .as_deref()
        .ok_or_else(|| Error::decode_field("to", "contract creation has no recipient"))?;

    if log.topics.len() < 3 {
        return Err(Error::decode_field(
            "topics",
            format!("expected 3 indexed topics, got {}", log.topics.len()),
        )
        .into());
    }

    let from = decode_address("from", &tx.from)?;
    let to = decode_address("to", to)?;
    let address = decode_address("log address", &log.address)?;
    let topic1 = decode_word("topics[1]", &log.topics[1])?;
    let topic2 = decode_word("topics[2]", &log.topics[2])?;

    let mut bytes = Vec::with_capacity(charon_core::EVENT_LEAF_LEN);
    bytes.extend_from_slice(&from);
    bytes.extend_from_slice(&to);
    bytes.extend_from_slice(&address);
    bytes.extend_from_slice(&topic1);
    bytes.extend_from_slice(&topic2);

    Ok(Leaf::from_bytes(bytes)?)
}

/// Produce the leaf for one transaction, substituting the event form when
/// the receipt carries a whitelisted log.
///
/// Returns the leaf and whether the substitution happened (the position's
/// transfer flag). With several matching logs the last one wins.
pub fn leaf_for_transaction(
    tx: &SourceTransaction,
    receipt: &SourceReceipt,
    filter: &EventFilter,
) -> Result<(Leaf, bool)> {
    let mut matched: Option<&SourceLog> = None;
    for log in &receipt.logs {
        let Some(topic0) = log.topics.first() else {
            continue;
        };
        if filter.matches(topic0)? {
            matched = Some(log);
        }
    }

    match matched {
        Some(log) => Ok((pack_log(tx, log)?, true)),
        None => Ok((pack_transaction(tx)?, false)),
    }
}
