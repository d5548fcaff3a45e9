//! Canonical leaf records and destination-chain block identifiers.
//!
//! A leaf is the fixed-format byte record of exactly one source-chain
//! transaction. It comes in two shapes: the packed-transaction form, and the
//! packed-event form that replaces it when the transaction's receipt carries
//! a whitelisted event log. Once appended to the ledger a leaf never changes
//! and its index is permanent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Byte length of a packed-transaction leaf:
/// sender(20) || recipient(20) || value(32) || hash(input)(32).
pub const TX_LEAF_LEN: usize = 104;

/// Byte length of a packed-event leaf:
/// sender(20) || recipient(20) || log address(20) || topic1(32) || topic2(32).
pub const EVENT_LEAF_LEN: usize = 124;

/// A canonical packed record of one transaction or qualifying event log.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Leaf(#[serde(with = "leaf_hex")] Vec<u8>);

mod leaf_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

impl Leaf {
    /// Create a leaf from packed bytes, validating the record width.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        match bytes.len() {
            TX_LEAF_LEN | EVENT_LEAF_LEN => Ok(Self(bytes)),
            n => Err(Error::invalid_leaf(format!(
                "expected {} or {} bytes, got {}",
                TX_LEAF_LEN, EVENT_LEAF_LEN, n
            ))),
        }
    }

    /// Decode a leaf from hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Self::from_bytes(hex::decode(s)?)
    }

    /// Encode as hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Get the packed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Record length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Leaves are never empty; provided for completeness.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this is the packed-event form.
    pub fn is_event(&self) -> bool {
        self.0.len() == EVENT_LEAF_LEN
    }

    /// Whether this is the packed-transaction form.
    pub fn is_transaction(&self) -> bool {
        self.0.len() == TX_LEAF_LEN
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Leaf({}.., {} bytes)", &self.to_hex()[..16], self.len())
    }
}

impl AsRef<[u8]> for Leaf {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Identifier of an accepted commitment on the destination chain.
///
/// The destination contract hands these out as monotonically increasing
/// values; on the wire they travel as bare hex.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockId(pub u64);

impl BlockId {
    /// Create a block id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parse from hex (an optional `0x` prefix is accepted).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| Error::decode_field("blockid", e.to_string()))
    }

    /// Encode as hex, matching the destination contract's id formatting.
    pub fn to_hex(&self) -> String {
        format!("{:x}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_width_validation() {
        assert!(Leaf::from_bytes(vec![0u8; TX_LEAF_LEN]).is_ok());
        assert!(Leaf::from_bytes(vec![0u8; EVENT_LEAF_LEN]).is_ok());
        assert!(Leaf::from_bytes(vec![0u8; 40]).is_err());
        assert!(Leaf::from_bytes(Vec::new()).is_err());
    }

    #[test]
    fn test_leaf_form_discrimination() {
        let tx = Leaf::from_bytes(vec![1u8; TX_LEAF_LEN]).unwrap();
        assert!(tx.is_transaction());
        assert!(!tx.is_event());

        let ev = Leaf::from_bytes(vec![2u8; EVENT_LEAF_LEN]).unwrap();
        assert!(ev.is_event());
        assert!(!ev.is_transaction());
    }

    #[test]
    fn test_leaf_hex_roundtrip() {
        let leaf = Leaf::from_bytes(vec![0xab; TX_LEAF_LEN]).unwrap();
        let restored = Leaf::from_hex(&leaf.to_hex()).unwrap();
        assert_eq!(leaf, restored);
    }

    #[test]
    fn test_leaf_serde_as_hex() {
        let leaf = Leaf::from_bytes(vec![0x01; TX_LEAF_LEN]).unwrap();
        let json = serde_json::to_string(&leaf).unwrap();
        assert!(json.contains(&"01".repeat(TX_LEAF_LEN)));
        let back: Leaf = serde_json::from_str(&json).unwrap();
        assert_eq!(leaf, back);
    }

    #[test]
    fn test_block_id_hex() {
        let id = BlockId::new(255);
        assert_eq!(id.to_hex(), "ff");
        assert_eq!(BlockId::from_hex("ff").unwrap(), id);
        assert_eq!(BlockId::from_hex("0xff").unwrap(), id);
        assert!(BlockId::from_hex("not-hex").is_err());
    }

    #[test]
    fn test_block_id_ordering() {
        assert!(BlockId::new(1) < BlockId::new(2));
    }
}
