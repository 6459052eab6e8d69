//! Merkle tree computation and inclusion proofs for block transactions.
//!
//! Leaves are transaction ids in internal byte order. Every level with an odd
//! number of nodes pairs its last node with a copy of itself, both when the
//! tree is built and when a branch is read from it.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::Hash256;

/// A fully built Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// `levels[0]` holds the leaves, the last level holds the root.
    levels: Vec<Vec<Hash256>>,
}

/// An inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Sibling hashes from the leaf level upward.
    pub branch: Vec<Hash256>,
    /// Position of the leaf.
    pub index: usize,
    /// Number of leaves in the tree.
    pub leaf_count: usize,
    /// Root the branch was read from.
    pub root: Hash256,
}

/// Pad a level to even length by repeating its last node.
///
/// This is the only place the duplicate-last rule is applied.
fn paired(level: &[Hash256]) -> Cow<'_, [Hash256]> {
    match level.last() {
        Some(last) if level.len() % 2 == 1 => {
            let mut padded = level.to_vec();
            padded.push(*last);
            Cow::Owned(padded)
        }
        _ => Cow::Borrowed(level),
    }
}

impl MerkleTree {
    /// Build the tree bottom-up.
    ///
    /// An empty leaf set gives an all-zero root and a single empty level.
    pub fn build(leaves: &[Hash256]) -> Self {
        let mut levels = vec![leaves.to_vec()];

        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next: Vec<Hash256> = paired(current)
                .chunks_exact(2)
                .map(|pair| Hash256::hash_pair(&pair[0], &pair[1]))
                .collect();
            levels.push(next);
        }

        MerkleTree { levels }
    }

    /// The Merkle root.
    pub fn root(&self) -> Hash256 {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Hash256::ZERO)
    }

    /// All levels, leaves first.
    pub fn levels(&self) -> &[Vec<Hash256>] {
        &self.levels
    }

    /// The leaves.
    pub fn leaves(&self) -> &[Hash256] {
        &self.levels[0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Read the inclusion branch for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Result<MerkleProof> {
        let leaf_count = self.leaf_count();
        if index >= leaf_count {
            return Err(Error::Index {
                index,
                count: leaf_count,
            });
        }

        let mut branch = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let level = paired(level);
            let sibling = idx ^ 1;
            if let Some(hash) = level.get(sibling) {
                branch.push(*hash);
            }
            idx /= 2;
        }

        Ok(MerkleProof {
            branch,
            index,
            leaf_count,
            root: self.root(),
        })
    }
}

/// Compute the merkle root from a list of transaction IDs.
pub fn compute_merkle_root(txids: &[Hash256]) -> Hash256 {
    MerkleTree::build(txids).root()
}

/// Build a tree, returning its root and levels.
pub fn build_tree(leaves: &[Hash256]) -> (Hash256, Vec<Vec<Hash256>>) {
    let tree = MerkleTree::build(leaves);
    (tree.root(), tree.levels)
}

/// Branch and root for the leaf at `index`.
pub fn get_proof(leaves: &[Hash256], index: usize) -> Result<(Vec<Hash256>, Hash256)> {
    let proof = MerkleTree::build(leaves).proof(index)?;
    Ok((proof.branch, proof.root))
}

/// Fold `branch` from `leaf` and compare the result with `expected_root`.
pub fn verify_proof(
    leaf: &Hash256,
    branch: &[Hash256],
    index: usize,
    expected_root: &Hash256,
) -> bool {
    let mut current = *leaf;
    let mut idx = index;

    for sibling in branch {
        current = if idx % 2 == 0 {
            Hash256::hash_pair(&current, sibling)
        } else {
            Hash256::hash_pair(sibling, &current)
        };
        idx /= 2;
    }

    current == *expected_root
}

impl MerkleProof {
    /// Check this proof for `leaf` against its own root.
    pub fn verify(&self, leaf: &Hash256) -> bool {
        verify_proof(leaf, &self.branch, self.index, &self.root)
    }

    /// Check this proof for `leaf` against an externally claimed root.
    pub fn verify_against(&self, leaf: &Hash256, root: &Hash256) -> bool {
        verify_proof(leaf, &self.branch, self.index, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::double_sha256;

    fn leaf(n: u32) -> Hash256 {
        Hash256(double_sha256(&n.to_le_bytes()))
    }

    fn leaves(count: u32) -> Vec<Hash256> {
        (0..count).map(leaf).collect()
    }

    // Parent hash written out by hand, independent of Hash256::hash_pair.
    fn parent(left: &Hash256, right: &Hash256) -> Hash256 {
        let mut combined = Vec::with_capacity(64);
        combined.extend_from_slice(&left.0);
        combined.extend_from_slice(&right.0);
        Hash256(double_sha256(&combined))
    }

    // Independent branch fold used to cross-check the engine.
    fn fold(leaf: Hash256, branch: &[Hash256], index: usize) -> Hash256 {
        branch.iter().enumerate().fold(leaf, |acc, (depth, sibling)| {
            if (index >> depth) & 1 == 0 {
                parent(&acc, sibling)
            } else {
                parent(sibling, &acc)
            }
        })
    }

    #[test]
    fn test_empty_tree() {
        let (root, levels) = build_tree(&[]);
        assert_eq!(root, Hash256::ZERO);
        assert_eq!(levels, vec![Vec::<Hash256>::new()]);
        assert_eq!(
            get_proof(&[], 0),
            Err(Error::Index { index: 0, count: 0 })
        );
    }

    #[test]
    fn test_single_leaf() {
        let only = leaf(7);
        let tree = MerkleTree::build(&[only]);
        assert_eq!(tree.root(), only);
        assert_eq!(tree.levels().len(), 1);

        let proof = tree.proof(0).unwrap();
        assert!(proof.branch.is_empty());
        assert_eq!(proof.root, only);
        assert!(verify_proof(&only, &proof.branch, 0, &only));
    }

    #[test]
    fn test_two_leaves() {
        let l = leaves(2);
        assert_eq!(compute_merkle_root(&l), parent(&l[0], &l[1]));
    }

    #[test]
    fn test_three_leaves_duplicate_last() {
        let l = leaves(3);
        let (root, levels) = build_tree(&l);

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], l);
        assert_eq!(levels[1], vec![parent(&l[0], &l[1]), parent(&l[2], &l[2])]);
        assert_eq!(root, parent(&levels[1][0], &levels[1][1]));

        // The duplicated node is its own sibling
        let (branch, _) = get_proof(&l, 2).unwrap();
        assert_eq!(branch, vec![l[2], levels[1][0]]);
    }

    #[test]
    fn test_four_leaves_branch() {
        let l = leaves(4);
        let h01 = parent(&l[0], &l[1]);
        let h23 = parent(&l[2], &l[3]);
        let root = parent(&h01, &h23);

        let (branch1, root1) = get_proof(&l, 1).unwrap();
        assert_eq!(root1, root);
        assert_eq!(branch1.len(), 2);
        assert_eq!(branch1, vec![l[0], h23]);

        // Index 0 and 1 share the level-1 sibling, not the leaf-level one
        let (branch0, _) = get_proof(&l, 0).unwrap();
        assert_eq!(branch0, vec![l[1], h23]);
        assert_ne!(branch0[0], branch1[0]);
        assert_eq!(branch0[1], branch1[1]);

        let (branch3, _) = get_proof(&l, 3).unwrap();
        assert_eq!(branch3, vec![l[2], h01]);
    }

    #[test]
    fn test_proof_symmetry() {
        for n in [1u32, 2, 3, 4, 5, 8, 9, 17] {
            let l = leaves(n);
            for i in 0..l.len() {
                let (branch, root) = get_proof(&l, i).unwrap();
                assert!(verify_proof(&l[i], &branch, i, &root), "n={} i={}", n, i);
                assert_eq!(fold(l[i], &branch, i), root, "fold n={} i={}", n, i);
            }
        }
    }

    #[test]
    fn test_odd_levels_above_leaves() {
        // 5 leaves: level 1 has 3 nodes and must duplicate too
        let l = leaves(5);
        let h01 = parent(&l[0], &l[1]);
        let h23 = parent(&l[2], &l[3]);
        let h44 = parent(&l[4], &l[4]);
        let h0123 = parent(&h01, &h23);
        let h4444 = parent(&h44, &h44);
        let root = parent(&h0123, &h4444);

        assert_eq!(compute_merkle_root(&l), root);
        let (branch, _) = get_proof(&l, 4).unwrap();
        assert_eq!(branch, vec![l[4], h44, h0123]);
    }

    #[test]
    fn test_tamper_detection() {
        let l = leaves(9);
        let index = 5;
        let (branch, root) = get_proof(&l, index).unwrap();

        for depth in 0..branch.len() {
            for byte in [0usize, 13, 31] {
                let mut tampered = branch.clone();
                tampered[depth].0[byte] ^= 0x01;
                assert!(!verify_proof(&l[index], &tampered, index, &root));
            }
        }

        for byte in 0..32 {
            let mut bad_leaf = l[index];
            bad_leaf.0[byte] ^= 0x80;
            assert!(!verify_proof(&bad_leaf, &branch, index, &root));
        }
    }

    #[test]
    fn test_wrong_index_fails() {
        let l = leaves(8);
        let (branch, root) = get_proof(&l, 3).unwrap();
        assert!(!verify_proof(&l[3], &branch, 2, &root));
        assert!(!verify_proof(&l[3], &branch, 3, &l[0]));
    }

    #[test]
    fn test_index_out_of_range() {
        let l = leaves(4);
        assert_eq!(
            MerkleTree::build(&l).proof(4),
            Err(Error::Index { index: 4, count: 4 })
        );
    }

    #[test]
    fn test_proof_struct_verify() {
        let l = leaves(17);
        let tree = MerkleTree::build(&l);
        let proof = tree.proof(16).unwrap();
        assert_eq!(proof.leaf_count, 17);
        assert!(proof.verify(&l[16]));
        assert!(proof.verify_against(&l[16], &tree.root()));
        assert!(!proof.verify(&l[15]));
    }
}
