//! SHA256 double-hashing and the 32-byte digest type.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::codec;
use crate::error::Result;

/// Double SHA256: SHA256(SHA256(data)).
///
/// Used for block header hashing, transaction IDs, and Merkle tree nodes.
/// The output is in internal byte order.
#[inline]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(&first);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second);
    result
}

/// A 32-byte digest held in internal (protocol) byte order.
///
/// Formats and serializes in display form, the way block explorers and RPC
/// responses print hashes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The all-zero digest.
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    /// Parse a display-form hex string (optional `0x`, left-padded to 64 digits).
    pub fn from_display_hex(display_hex: &str) -> Result<Self> {
        codec::to_internal(display_hex).map(Hash256)
    }

    /// Parse a hex string that is already in internal byte order.
    pub fn from_internal_hex(internal_hex: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(codec::strip_hex_prefix(internal_hex.trim()), &mut bytes)?;
        Ok(Hash256(bytes))
    }

    /// Hash `data` with double SHA256.
    pub fn double_hash(data: &[u8]) -> Self {
        Hash256(double_sha256(data))
    }

    /// Double SHA256 of `left || right`, the Merkle parent rule.
    pub fn hash_pair(left: &Hash256, right: &Hash256) -> Self {
        let mut combined = [0u8; 64];
        combined[..32].copy_from_slice(&left.0);
        combined[32..].copy_from_slice(&right.0);
        Hash256::double_hash(&combined)
    }

    /// Raw internal-order bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Byte-reversed hex, as shown by explorers.
    pub fn to_display_hex(&self) -> String {
        codec::to_display(&self.0)
    }

    /// Hex of the internal-order bytes.
    pub fn to_internal_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Eight big-endian words read from the internal bytes.
    pub fn words(&self) -> [u32; 8] {
        codec::digest_words(&self.0)
    }

    /// Build a digest from its eight big-endian words.
    pub fn from_words(words: &[u32; 8]) -> Self {
        Hash256(codec::from_digest_words(words))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_display_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_display_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_display_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The three renderings the tooling reports for every digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestView {
    /// Byte-reversed hex.
    pub display: String,
    /// Internal-order hex.
    pub internal: String,
    /// Big-endian words of the internal bytes.
    pub words: [u32; 8],
}

impl From<&Hash256> for DigestView {
    fn from(hash: &Hash256) -> Self {
        DigestView {
            display: hash.to_display_hex(),
            internal: hash.to_internal_hex(),
            words: hash.words(),
        }
    }
}
