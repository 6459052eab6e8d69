//! Shapes of the already-fetched data handed to the core.
//!
//! These mirror the JSON returned by a node's `getblockheader` and
//! `getblock` (verbosity 1) calls. Nothing here talks to the network.

use serde::{Deserialize, Serialize};

use crate::block::{extract_solution, BlockHeader};
use crate::codec::{self, parse_hex_u256};
use crate::error::{Error, Result};
use crate::hash::Hash256;
use crate::merkle::verify_proof;

/// A numeric field that nodes report either as an integer or a hex string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HexOrInt {
    Int(u64),
    Hex(String),
}

impl HexOrInt {
    /// Interpret the value as a 32-bit integer.
    pub fn to_u32(&self) -> Result<u32> {
        match self {
            HexOrInt::Int(value) => u32::try_from(*value).map_err(|_| Error::Range { width: 4 }),
            HexOrInt::Hex(hex_str) => {
                let digits = codec::strip_hex_prefix(hex_str.trim());
                u32::from_str_radix(digits, 16).map_err(|e| Error::Format(e.to_string()))
            }
        }
    }
}

/// Header fields as reported by `getblockheader`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHeader {
    /// Claimed block hash (display form).
    pub hash: String,
    pub version: u32,
    /// Absent for the genesis block.
    #[serde(default)]
    pub previousblockhash: Option<String>,
    pub merkleroot: String,
    /// Absent on nodes that predate the field.
    #[serde(default)]
    pub blockcommitments: Option<String>,
    pub time: u32,
    pub bits: HexOrInt,
    /// 256-bit nonce as hex (display form, i.e. the big-endian integer).
    #[serde(default)]
    pub nonce: Option<String>,
}

impl RemoteHeader {
    /// Build a header, taking the solution from `raw_block`.
    pub fn into_header(&self, raw_block: &[u8]) -> Result<BlockHeader> {
        let optional_hash = |field: &Option<String>| match field {
            Some(hex_str) => Hash256::from_display_hex(hex_str),
            None => Ok(Hash256::ZERO),
        };

        let nonce = match &self.nonce {
            Some(hex_str) => parse_hex_u256(hex_str)?,
            None => ethnum::u256::ZERO,
        };

        Ok(BlockHeader {
            version: self.version,
            prev_block_hash: optional_hash(&self.previousblockhash)?,
            merkle_root: Hash256::from_display_hex(&self.merkleroot)?,
            block_commitments: optional_hash(&self.blockcommitments)?,
            time: self.time,
            bits: self.bits.to_u32()?,
            nonce,
            solution: extract_solution(raw_block)?.data.to_vec(),
        })
    }
}

/// Block summary as reported by `getblock` with verbosity 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBlock {
    /// Block hash (display form).
    pub hash: String,
    /// Claimed Merkle root (display form).
    pub merkleroot: String,
    /// Transaction ids in block order (display form).
    pub tx: Vec<String>,
}

/// A proof as published by the proof tooling, all hashes in display form.
///
/// Some tooling publishes the block hash instead of the root; the root must
/// then be supplied with [`with_root`](Self::with_root) before verifying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedProof {
    pub tx_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merkle_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    pub merkle_branch: Vec<String>,
    pub merkle_index: usize,
    #[serde(default)]
    pub tx_count: Option<usize>,
}

impl ClaimedProof {
    /// Replace the claimed root.
    pub fn with_root(mut self, root_hex: impl Into<String>) -> Self {
        self.merkle_root = Some(root_hex.into());
        self
    }

    /// Fold the published branch from `tx_id` and compare with `merkle_root`.
    pub fn verify(&self) -> Result<bool> {
        if let Some(count) = self.tx_count {
            if self.merkle_index >= count {
                return Err(Error::Index {
                    index: self.merkle_index,
                    count,
                });
            }
        }

        let leaf = Hash256::from_display_hex(&self.tx_id)?;
        let root_hex = self
            .merkle_root
            .as_deref()
            .ok_or(Error::MissingField("merkle_root"))?;
        let root = Hash256::from_display_hex(root_hex)?;
        let branch = self
            .merkle_branch
            .iter()
            .map(|sibling| Hash256::from_display_hex(sibling))
            .collect::<Result<Vec<_>>>()?;

        Ok(verify_proof(&leaf, &branch, self.merkle_index, &root))
    }
}
