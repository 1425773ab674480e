//! # BIP-340 Tagged Hashes for Taproot Commitments
//!
//! `TaggedHash(tag, msg) = SHA256(SHA256(tag) || SHA256(tag) || msg)`
//!
//! Three tags are used when committing a script tree into an output key:
//!
//! | Tag         | Message                                             |
//! |-------------|-----------------------------------------------------|
//! | `TapLeaf`   | `leaf_version || compact_size(len(script)) || script` |
//! | `TapBranch` | `min(left, right) || max(left, right)`              |
//! | `TapTweak`  | `x(internal_key) || merkle_root`                    |

use bitcoin::{
    consensus::encode::{serialize, VarInt},
    secp256k1::XOnlyPublicKey,
    Script,
};
use sha2::{Digest, Sha256};
use std::fmt;

/// Tag for leaf hashes
pub const TAG_TAP_LEAF: &str = "TapLeaf";

/// Tag for internal node hashes
pub const TAG_TAP_BRANCH: &str = "TapBranch";

/// Tag for the output key tweak
pub const TAG_TAP_TWEAK: &str = "TapTweak";

/// A 32-byte node hash inside a Taproot script tree (leaf or branch).
///
/// Ordering is lexicographic over the raw bytes, which is the ordering the
/// branch hash and the tree assembly rely on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TapHash([u8; 32]);

impl TapHash {
    /// Wrap raw hash bytes
    pub const fn from_byte_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Copy out the raw hash bytes
    pub const fn to_byte_array(self) -> [u8; 32] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for TapHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for TapHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TapHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TapHash({})", self)
    }
}

/// Compute a BIP-340 tagged hash over the concatenation of `parts`.
pub fn tagged_hash(tag: &str, parts: &[&[u8]]) -> [u8; 32] {
    let tag_hash = Sha256::digest(tag.as_bytes());

    let mut hasher = Sha256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Hash of a single tapscript leaf.
pub fn leaf_hash(leaf_version: u8, script: &Script) -> TapHash {
    let script_len = serialize(&VarInt(script.len() as u64));
    TapHash(tagged_hash(
        TAG_TAP_LEAF,
        &[&[leaf_version][..], &script_len[..], script.as_bytes()],
    ))
}

/// Hash of an internal node. Children are ordered by hash value, not by position.
pub fn branch_hash(a: &TapHash, b: &TapHash) -> TapHash {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    TapHash(tagged_hash(TAG_TAP_BRANCH, &[&first.0[..], &second.0[..]]))
}

/// Raw tweak bytes committing `internal_key` to `merkle_root`.
pub fn tweak_hash(internal_key: &XOnlyPublicKey, merkle_root: &TapHash) -> [u8; 32] {
    tagged_hash(TAG_TAP_TWEAK, &[&internal_key.serialize()[..], &merkle_root.0[..]])
}
