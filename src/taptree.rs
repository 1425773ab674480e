//! # Taproot Script Tree
//!
//! Leaves are committed into a single Merkle root with a canonical layout that
//! depends only on the *set* of leaf hashes, never on the order the caller
//! supplied them in. At every level:
//!
//! 1. node hashes are sorted ascending (lexicographic over the 32 bytes)
//! 2. consecutive pairs are joined into `TapBranch` hashes
//! 3. an odd node out moves up to the next level unchanged
//!
//! ```text
//! three leaves, hashes a < b < c:
//!
//!            root = B(B(a, b), c)
//!           /                  \
//!       B(a, b)                 c
//!       /     \
//!      a       b
//! ```
//!
//! Each leaf's Merkle proof is the list of sibling hashes met while climbing
//! from the leaf to the root.

use crate::config::protocol::{MAX_TAPROOT_DEPTH, TAPSCRIPT_LEAF_VERSION};
use crate::error::{StakingError, StakingResult};
use crate::hashes::{branch_hash, leaf_hash, TapHash};
use bitcoin::{Script, ScriptBuf};

/// A tapscript leaf with its hash computed once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapLeaf {
    version: u8,
    script: ScriptBuf,
    hash: TapHash,
}

impl TapLeaf {
    /// Wrap a script with the tapscript leaf version (0xc0).
    pub fn new(script: ScriptBuf) -> Self {
        let hash = leaf_hash(TAPSCRIPT_LEAF_VERSION, &script);
        Self {
            version: TAPSCRIPT_LEAF_VERSION,
            script,
            hash,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn hash(&self) -> TapHash {
        self.hash
    }
}

/// Sibling hashes from a leaf up to the root, bottom to top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerkleProof(Vec<TapHash>);

impl MerkleProof {
    /// Parse a concatenation of 32-byte hashes.
    pub fn from_bytes(bytes: &[u8]) -> StakingResult<Self> {
        if bytes.len() % 32 != 0 {
            return Err(StakingError::param(format!(
                "merkle proof length {} is not a multiple of 32",
                bytes.len()
            )));
        }
        if bytes.len() / 32 > MAX_TAPROOT_DEPTH {
            return Err(StakingError::param(format!(
                "merkle proof depth {} exceeds {}",
                bytes.len() / 32,
                MAX_TAPROOT_DEPTH
            )));
        }

        let hashes = bytes
            .chunks_exact(32)
            .map(|chunk| {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(chunk);
                TapHash::from_byte_array(hash)
            })
            .collect();
        Ok(Self(hashes))
    }

    pub fn hashes(&self) -> &[TapHash] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fold branch hashes up the path, starting from `leaf`.
    pub fn compute_root(&self, leaf: TapHash) -> TapHash {
        self.0
            .iter()
            .fold(leaf, |node, sibling| branch_hash(&node, sibling))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.len() * 32);
        for hash in &self.0 {
            bytes.extend_from_slice(hash.as_bytes());
        }
        bytes
    }
}

/// A node of the tree under construction: its hash and the leaves beneath it.
struct Node {
    hash: TapHash,
    leaves: Vec<usize>,
}

impl Node {
    fn join(left: Node, right: Node, proofs: &mut [Vec<TapHash>]) -> Node {
        for &leaf in &left.leaves {
            proofs[leaf].push(right.hash);
        }
        for &leaf in &right.leaves {
            proofs[leaf].push(left.hash);
        }

        let mut leaves = left.leaves;
        leaves.extend(right.leaves);
        Node {
            hash: branch_hash(&left.hash, &right.hash),
            leaves,
        }
    }
}

/// An assembled script tree: leaves in caller order, one proof per leaf, and the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapTree {
    leaves: Vec<TapLeaf>,
    proofs: Vec<MerkleProof>,
    root: TapHash,
}

impl TapTree {
    /// Assemble `leaves` into a tree using the sorted level-by-level pairing.
    ///
    /// A single leaf is its own root with an empty proof.
    pub fn assemble(leaves: Vec<TapLeaf>) -> StakingResult<Self> {
        if leaves.is_empty() {
            return Err(StakingError::EmptyTree);
        }

        let mut proofs: Vec<Vec<TapHash>> = vec![Vec::new(); leaves.len()];
        let mut level: Vec<Node> = leaves
            .iter()
            .enumerate()
            .map(|(index, leaf)| Node {
                hash: leaf.hash(),
                leaves: vec![index],
            })
            .collect();

        while level.len() > 1 {
            level.sort_by(|a, b| a.hash.cmp(&b.hash));

            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut nodes = level.into_iter();
            while let Some(left) = nodes.next() {
                match nodes.next() {
                    Some(right) => next.push(Node::join(left, right, &mut proofs)),
                    None => next.push(left),
                }
            }
            level = next;
        }

        let root = level.pop().map(|node| node.hash).ok_or(StakingError::EmptyTree)?;
        log::trace!("assembled tap tree with {} leaves, root {}", leaves.len(), root);

        Ok(Self {
            leaves,
            proofs: proofs.into_iter().map(MerkleProof).collect(),
            root,
        })
    }

    pub fn root(&self) -> TapHash {
        self.root
    }

    pub fn leaves(&self) -> &[TapLeaf] {
        &self.leaves
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Proof for the leaf at `index` in the order leaves were supplied.
    pub fn proof(&self, index: usize) -> Option<&MerkleProof> {
        self.proofs.get(index)
    }

    /// Position of the first leaf with hash `leaf_hash`.
    pub fn leaf_index(&self, leaf_hash: &TapHash) -> Option<usize> {
        self.leaves.iter().position(|leaf| leaf.hash() == *leaf_hash)
    }

    /// Proof for the leaf identified by its hash.
    pub fn proof_for(&self, leaf_hash: &TapHash) -> Option<&MerkleProof> {
        self.leaf_index(leaf_hash).and_then(|index| self.proof(index))
    }
}
