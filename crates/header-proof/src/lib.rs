//! Block header hash verification and Merkle inclusion proofs for
//! Equihash-based chains.
//!
//! This crate provides pure Rust implementations of:
//! - Display/internal byte-order conversion for 32-byte digests
//! - Compact-size prefixed field decoding
//! - Equihash block header serialization and double SHA256 hashing
//! - Proof-of-work target and work decoding from compact bits
//! - Merkle tree construction, inclusion proofs and proof verification
//! - 224-bit verification identifiers derived from block hashes
//!
//! Every operation is a pure function of already-fetched data; fetching
//! headers and blocks from a node is left to the caller.

pub mod block;
pub mod codec;
pub mod compact_size;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod pow;
pub mod remote;
pub mod report;
pub mod verification_id;
pub mod verify;

pub use block::{extract_solution, BlockHeader};
pub use compact_size::{decode_var_bytes, VarBytes};
pub use error::{Error, Result};
pub use hash::{double_sha256, DigestView, Hash256};
pub use merkle::{compute_merkle_root, MerkleProof, MerkleTree};
pub use pow::{bits_to_target, bits_to_work, target_to_work};
pub use remote::{ClaimedProof, RemoteBlock, RemoteHeader};
pub use report::{HeaderReport, ProofReport};
pub use verification_id::{pack_verification_id, VerificationId};
pub use verify::{
    build_proof, compute_verification_id, verify_header, verify_proof, VerificationResult,
};

/// Re-exported so callers can name nonce, target and work values.
pub use ethnum::u256;
