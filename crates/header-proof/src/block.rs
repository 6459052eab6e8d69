//! Equihash block header construction and serialization.
//!
//! The hashed header is 140 bytes of fixed fields followed by the
//! compact-size prefixed Equihash solution.

use ethnum::u256;

use crate::compact_size::{decode_var_bytes, encode_compact_size, VarBytes};
use crate::error::Result;
use crate::hash::Hash256;
use crate::pow::{bits_to_target, bits_to_work};

/// Size of the fixed-width part of the header.
pub const FIXED_HEADER_SIZE: usize = 140;

/// Offset of the solution field inside a raw block.
pub const SOLUTION_OFFSET: usize = FIXED_HEADER_SIZE;

/// An Equihash block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version.
    pub version: u32,
    /// Hash of the previous block (internal byte order).
    pub prev_block_hash: Hash256,
    /// Merkle root of all transactions.
    pub merkle_root: Hash256,
    /// Block commitments hash (final sapling root / chain history root).
    pub block_commitments: Hash256,
    /// Block timestamp (Unix time).
    pub time: u32,
    /// Difficulty target in compact "bits" format.
    pub bits: u32,
    /// 256-bit nonce.
    pub nonce: u256,
    /// Equihash solution, without its length prefix.
    pub solution: Vec<u8>,
}

impl BlockHeader {
    /// Serialize the fixed 140-byte part of the header.
    pub fn serialize_fixed(&self) -> [u8; FIXED_HEADER_SIZE] {
        let mut header = [0u8; FIXED_HEADER_SIZE];

        // Version (4 bytes, little-endian)
        header[0..4].copy_from_slice(&self.version.to_le_bytes());

        // Previous block hash, merkle root, commitments (32 bytes each, internal order)
        header[4..36].copy_from_slice(self.prev_block_hash.as_bytes());
        header[36..68].copy_from_slice(self.merkle_root.as_bytes());
        header[68..100].copy_from_slice(self.block_commitments.as_bytes());

        // Time and bits (4 bytes each, little-endian)
        header[100..104].copy_from_slice(&self.time.to_le_bytes());
        header[104..108].copy_from_slice(&self.bits.to_le_bytes());

        // Nonce (32 bytes, little-endian)
        header[108..140].copy_from_slice(&self.nonce.to_le_bytes());

        header
    }

    /// Serialize the header for hashing.
    ///
    /// The solution is copied from `raw_block` at [`SOLUTION_OFFSET`] together
    /// with its original compact-size prefix. The prefix is never re-encoded:
    /// the block hash commits to the exact bytes found in the block.
    pub fn serialize(&self, raw_block: &[u8]) -> Result<Vec<u8>> {
        let solution = extract_solution(raw_block)?;

        let mut serialized = Vec::with_capacity(FIXED_HEADER_SIZE + solution.consumed());
        serialized.extend_from_slice(&self.serialize_fixed());
        serialized.extend_from_slice(solution.raw);

        tracing::debug!(
            bytes = serialized.len(),
            solution_len = solution.data.len(),
            "serialized header"
        );
        Ok(serialized)
    }

    /// Block hash (double SHA256 of [`serialize`](Self::serialize)).
    pub fn hash(&self, raw_block: &[u8]) -> Result<Hash256> {
        Ok(Hash256::double_hash(&self.serialize(raw_block)?))
    }

    /// Header bytes with the solution prefix written in canonical form.
    ///
    /// This is how a block producer lays the header out; verification uses
    /// [`serialize`](Self::serialize) instead.
    pub fn encode_canonical(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FIXED_HEADER_SIZE + 3 + self.solution.len());
        out.extend_from_slice(&self.serialize_fixed());
        encode_compact_size(self.solution.len() as u64, &mut out);
        out.extend_from_slice(&self.solution);
        out
    }

    /// The 256-bit target encoded by `bits`.
    pub fn target(&self) -> Result<u256> {
        bits_to_target(self.bits)
    }

    /// The work value encoded by `bits`; zero when the target does not fit
    /// in 256 bits.
    pub fn work(&self) -> u256 {
        bits_to_work(self.bits)
    }
}

/// Locate the solution field of a raw block.
pub fn extract_solution(raw_block: &[u8]) -> Result<VarBytes<'_>> {
    decode_var_bytes(raw_block, SOLUTION_OFFSET)
}
