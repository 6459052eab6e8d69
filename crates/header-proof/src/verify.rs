//! Verification entry points used by the presentation layer.
//!
//! A mismatch between computed and claimed values is reported as a
//! [`VerificationResult`] with `valid == false`, not as an error. Errors mean
//! the check could not be carried out (bad hex, truncated block, unknown
//! transaction).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::block::BlockHeader;
use crate::codec;
use crate::error::{Error, Result};
use crate::hash::Hash256;
use crate::merkle::{self, MerkleProof, MerkleTree};
use crate::verification_id::VerificationId;

/// Outcome of comparing a computed hash with a claimed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether the computed hash equals the claimed hash.
    pub valid: bool,
    /// Computed hash (display form).
    pub computed_hash_hex: String,
    /// Claimed hash (display form, normalized).
    pub expected_hash_hex: String,
}

impl VerificationResult {
    fn compare(computed: &Hash256, expected: &Hash256) -> Self {
        VerificationResult {
            valid: computed == expected,
            computed_hash_hex: computed.to_display_hex(),
            expected_hash_hex: expected.to_display_hex(),
        }
    }

    /// Turn a failed check into [`Error::VerificationMismatch`].
    pub fn ensure_valid(self) -> Result<Self> {
        if self.valid {
            Ok(self)
        } else {
            Err(Error::VerificationMismatch {
                expected: self.expected_hash_hex,
                computed: self.computed_hash_hex,
            })
        }
    }
}

/// Decode a raw block given as hex (optional `0x`).
pub fn decode_raw_block(raw_block_hex: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(codec::strip_hex_prefix(raw_block_hex.trim()))?)
}

/// Recompute the block hash from `header` and the raw block, and compare it
/// with `claimed_hash_hex`.
pub fn verify_header(
    header: &BlockHeader,
    raw_block_hex: &str,
    claimed_hash_hex: &str,
) -> Result<VerificationResult> {
    let raw_block = decode_raw_block(raw_block_hex)?;
    verify_header_bytes(header, &raw_block, claimed_hash_hex)
}

/// [`verify_header`] for an already decoded raw block.
pub fn verify_header_bytes(
    header: &BlockHeader,
    raw_block: &[u8],
    claimed_hash_hex: &str,
) -> Result<VerificationResult> {
    let claimed = Hash256::from_display_hex(claimed_hash_hex)?;
    let computed = header.hash(raw_block)?;
    let result = VerificationResult::compare(&computed, &claimed);

    if result.valid {
        debug!(hash = %computed, "header hash verified");
    } else {
        warn!(expected = %claimed, computed = %computed, "header hash mismatch");
    }
    Ok(result)
}

/// Parse a list of display-form transaction ids into internal-order leaves.
pub fn parse_txids<S: AsRef<str>>(txids_hex: &[S]) -> Result<Vec<Hash256>> {
    txids_hex
        .iter()
        .map(|txid| Hash256::from_display_hex(txid.as_ref()))
        .collect()
}

/// Build the inclusion proof for `target_txid_hex` within `txids_hex`.
///
/// Transaction ids are compared as digests, so case and `0x` prefixes do not
/// matter.
pub fn build_proof<S: AsRef<str>>(txids_hex: &[S], target_txid_hex: &str) -> Result<MerkleProof> {
    let leaves = parse_txids(txids_hex)?;
    let target = Hash256::from_display_hex(target_txid_hex)?;

    let index = leaves
        .iter()
        .position(|leaf| *leaf == target)
        .ok_or_else(|| Error::NotFound(target.to_display_hex()))?;

    let proof = MerkleTree::build(&leaves).proof(index)?;
    debug!(
        txid = %target,
        index,
        tx_count = leaves.len(),
        depth = proof.branch.len(),
        "built merkle proof"
    );
    Ok(proof)
}

/// Check `proof` for the leaf `leaf_hex` against the claimed root `root_hex`.
pub fn verify_proof(proof: &MerkleProof, leaf_hex: &str, root_hex: &str) -> Result<bool> {
    let leaf = Hash256::from_display_hex(leaf_hex)?;
    let root = Hash256::from_display_hex(root_hex)?;

    let valid = merkle::verify_proof(&leaf, &proof.branch, proof.index, &root);
    if !valid {
        warn!(txid = %leaf, root = %root, index = proof.index, "merkle proof does not verify");
    }
    Ok(valid)
}

/// Verification identifier for a display-form block hash, rendered as `0x`
/// plus 56 hex digits.
pub fn compute_verification_id(hash_hex: &str) -> Result<String> {
    VerificationId::from_display_hex(hash_hex).map(|id| id.to_hex())
}
