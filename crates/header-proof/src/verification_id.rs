//! Compact verification identifiers derived from block hashes.
//!
//! The identifier packs the first seven big-endian words of the internal-order
//! block hash into a 224-bit integer and drops the eighth word. It is a
//! correlation handle for downstream consumers that expect exactly this
//! packing. It is lossy and must not be used as a commitment to the hash.

use core::fmt;

use ethnum::u256;
use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::hash::Hash256;

/// Number of hex digits in a rendered identifier (224 bits).
pub const VERIFICATION_ID_HEX_LEN: usize = 56;

/// A 224-bit verification identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerificationId(u256);

/// Fold words 0..=6 as `result = result * 2^32 + word`; word 7 is discarded.
pub fn pack_verification_id(words: &[u32; 8]) -> VerificationId {
    let packed = words[..7]
        .iter()
        .fold(u256::ZERO, |acc, word| (acc << 32u32) | u256::from(*word));
    VerificationId(packed)
}

impl VerificationId {
    /// Identifier for a block hash.
    pub fn from_hash(hash: &Hash256) -> Self {
        pack_verification_id(&hash.words())
    }

    /// Identifier for a display-form block hash string.
    pub fn from_display_hex(hash_hex: &str) -> Result<Self> {
        Hash256::from_display_hex(hash_hex).map(|hash| Self::from_hash(&hash))
    }

    /// The packed value.
    pub fn value(&self) -> u256 {
        self.0
    }

    /// `0x` followed by exactly 56 zero-padded hex digits.
    pub fn to_hex(&self) -> String {
        let bytes = self.0.to_be_bytes();
        // The top 32 bits are always zero
        format!("0x{}", hex::encode(&bytes[4..]))
    }
}

impl fmt::Display for VerificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for VerificationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
