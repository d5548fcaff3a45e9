//! Hashing primitives shared by the merkle engine and the relay.
//!
//! Everything hashes with Keccak-256. The digest's most significant bit is
//! reserved: merkle node hashes always carry it cleared, and proof entries
//! use it on the wire to mark whether the sibling sits on the right. Both
//! leaf hashing and internal node hashing use the same primitive; the
//! on-chain verifier depends on that.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::{Error, Result};

/// Mask for the reserved direction-flag bit (bit 255 of the digest).
const FLAG_MASK: u8 = 0x80;

/// A 32-byte hash value.
///
/// Ordering is lexicographic over the bytes, which for fixed-width
/// big-endian values is the numeric order the sorted merkle level relies on.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Create a hash from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create from a hex string (an optional `0x` prefix is accepted).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(Error::decode(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether the reserved flag bit is set.
    pub fn is_flagged(&self) -> bool {
        self.0[0] & FLAG_MASK != 0
    }

    /// Copy with the reserved flag bit set.
    pub fn with_flag(&self) -> Self {
        let mut bytes = self.0;
        bytes[0] |= FLAG_MASK;
        Self(bytes)
    }

    /// Copy with the reserved flag bit cleared.
    pub fn without_flag(&self) -> Self {
        let mut bytes = self.0;
        bytes[0] &= !FLAG_MASK;
        Self(bytes)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Keccak-256 of arbitrary data, flag bit untouched.
pub fn keccak(data: &[u8]) -> Hash {
    let digest = Keccak256::digest(data);
    Hash(digest.into())
}

/// Hash data into a merkle node value: Keccak-256 with the flag bit cleared.
pub fn merkle_hash(data: &[u8]) -> Hash {
    keccak(data).without_flag()
}

/// Hash two child node values to produce their parent.
pub fn hash_pair(left: Hash, right: Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Hash::from_bytes(hasher.finalize().into()).without_flag()
}
