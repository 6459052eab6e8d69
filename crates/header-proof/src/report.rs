//! Serializable summaries of header and proof checks.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::block::BlockHeader;
use crate::error::Result;
use crate::hash::{DigestView, Hash256};
use crate::merkle::MerkleProof;
use crate::pow::to_decimal_string;
use crate::remote::{RemoteBlock, RemoteHeader};
use crate::verification_id::VerificationId;
use crate::verify::{build_proof, decode_raw_block, verify_header_bytes, VerificationResult};

/// Everything known about one verified header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderReport {
    pub block_hash: DigestView,
    pub version: u32,
    pub time: u32,
    /// Bits as `0x`-prefixed hex.
    pub bits: String,
    /// Nonce in decimal.
    pub nonce: String,
    /// Work encoded by `bits`, in decimal.
    pub pow: String,
    pub prev_block_hash: DigestView,
    pub merkle_root: DigestView,
    pub block_commitments: DigestView,
    pub solution_len: usize,
    pub solution_hex: String,
    pub verification: VerificationResult,
    pub verification_id: String,
}

impl HeaderReport {
    /// Build the header from remote fields and a raw block, then verify it
    /// against the remote's claimed hash.
    pub fn from_remote(remote: &RemoteHeader, raw_block_hex: &str) -> Result<Self> {
        let raw_block = decode_raw_block(raw_block_hex)?;
        let header = remote.into_header(&raw_block)?;
        let verification = verify_header_bytes(&header, &raw_block, &remote.hash)?;
        Self::new(&header, verification)
    }

    /// Summarize `header` with an existing verification outcome.
    pub fn new(header: &BlockHeader, verification: VerificationResult) -> Result<Self> {
        let block_hash = Hash256::from_display_hex(&verification.expected_hash_hex)?;

        Ok(HeaderReport {
            block_hash: DigestView::from(&block_hash),
            version: header.version,
            time: header.time,
            bits: format!("0x{:08x}", header.bits),
            nonce: to_decimal_string(header.nonce),
            pow: to_decimal_string(header.work()),
            prev_block_hash: DigestView::from(&header.prev_block_hash),
            merkle_root: DigestView::from(&header.merkle_root),
            block_commitments: DigestView::from(&header.block_commitments),
            solution_len: header.solution.len(),
            solution_hex: hex::encode(&header.solution),
            verification_id: VerificationId::from_hash(&block_hash).to_hex(),
            verification,
        })
    }
}

/// An inclusion proof with every digest in all three renderings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofReport {
    pub tx_id: DigestView,
    pub block_hash: DigestView,
    /// Root claimed by the block.
    pub merkle_root: DigestView,
    pub merkle_branch: Vec<DigestView>,
    pub merkle_index: usize,
    pub tx_count: usize,
    /// Whether the root rebuilt from the transaction list equals the claim.
    pub root_matches: bool,
}

impl ProofReport {
    /// Prove inclusion of `txid_hex` in `block`.
    ///
    /// A rebuilt root that disagrees with the block's claimed root is logged
    /// and flagged in `root_matches`; the proof is still returned.
    pub fn from_remote(block: &RemoteBlock, txid_hex: &str) -> Result<Self> {
        let proof = build_proof(block.tx.as_slice(), txid_hex)?;
        let claimed_root = Hash256::from_display_hex(&block.merkleroot)?;
        let block_hash = Hash256::from_display_hex(&block.hash)?;
        let tx_id = Hash256::from_display_hex(txid_hex)?;

        let root_matches = proof.root == claimed_root;
        if !root_matches {
            warn!(
                computed = %proof.root,
                expected = %claimed_root,
                block = %block_hash,
                "computed merkle root differs from block header"
            );
        }

        Ok(Self::new(&tx_id, &block_hash, &claimed_root, &proof, root_matches))
    }

    fn new(
        tx_id: &Hash256,
        block_hash: &Hash256,
        merkle_root: &Hash256,
        proof: &MerkleProof,
        root_matches: bool,
    ) -> Self {
        ProofReport {
            tx_id: DigestView::from(tx_id),
            block_hash: DigestView::from(block_hash),
            merkle_root: DigestView::from(merkle_root),
            merkle_branch: proof.branch.iter().map(DigestView::from).collect(),
            merkle_index: proof.index,
            tx_count: proof.leaf_count,
            root_matches,
        }
    }
}
