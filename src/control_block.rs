//! # Control Blocks
//!
//! The control block a spender appends to a script-path witness:
//!
//! ```text
//! [leaf_version | parity] (1) || x(internal_key) (32) || merkle proof (32 * depth)
//! ```

use crate::error::{StakingError, StakingResult};
use crate::hashes::leaf_hash;
use crate::taptree::MerkleProof;
use crate::tweak::tweak;
use bitcoin::secp256k1::{Parity, Secp256k1, Verification, XOnlyPublicKey};
use bitcoin::Script;

/// Proof that a leaf script is committed in an output key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlBlock {
    leaf_version: u8,
    output_key_parity: Parity,
    internal_key: XOnlyPublicKey,
    merkle_proof: MerkleProof,
}

impl ControlBlock {
    pub fn new(
        leaf_version: u8,
        internal_key: XOnlyPublicKey,
        output_key_parity: Parity,
        merkle_proof: MerkleProof,
    ) -> Self {
        Self {
            leaf_version,
            output_key_parity,
            internal_key,
            merkle_proof,
        }
    }

    /// Build from a raw concatenated proof. The only validation is on the
    /// leaf version's parity bit and the proof's length.
    pub fn from_parts(
        leaf_version: u8,
        internal_key: XOnlyPublicKey,
        output_key_parity: Parity,
        proof: &[u8],
    ) -> StakingResult<Self> {
        if leaf_version & 1 != 0 {
            return Err(StakingError::param(format!(
                "leaf version {:#04x} has its parity bit set",
                leaf_version
            )));
        }
        let merkle_proof = MerkleProof::from_bytes(proof)?;
        Ok(Self::new(leaf_version, internal_key, output_key_parity, merkle_proof))
    }

    pub fn leaf_version(&self) -> u8 {
        self.leaf_version
    }

    pub fn output_key_parity(&self) -> Parity {
        self.output_key_parity
    }

    pub fn internal_key(&self) -> XOnlyPublicKey {
        self.internal_key
    }

    pub fn merkle_proof(&self) -> &MerkleProof {
        &self.merkle_proof
    }

    /// Serialized length in bytes
    pub fn size(&self) -> usize {
        33 + 32 * self.merkle_proof.len()
    }

    /// Serialize into a freshly allocated buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.push(self.leaf_version | self.output_key_parity.to_u8());
        bytes.extend_from_slice(&self.internal_key.serialize());
        bytes.extend(self.merkle_proof.to_bytes());
        bytes
    }

    /// Check that `script` under this control block commits to `output_key`.
    pub fn verify<C: Verification>(
        &self,
        secp: &Secp256k1<C>,
        output_key: &XOnlyPublicKey,
        script: &Script,
    ) -> bool {
        let root = self
            .merkle_proof
            .compute_root(leaf_hash(self.leaf_version, script));

        match tweak(secp, &self.internal_key, &root) {
            Ok(tweaked) => {
                tweaked.output_key() == *output_key && tweaked.parity() == self.output_key_parity
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::protocol::TAPSCRIPT_LEAF_VERSION;
    use crate::hashes::TapHash;
    use crate::tweak::unspendable_internal_key;

    #[test]
    fn test_packing_layout() {
        let internal = unspendable_internal_key().unwrap();
        let proof = MerkleProof::from_bytes(&[[0xaa; 32], [0xbb; 32]].concat()).unwrap();

        let even = ControlBlock::new(TAPSCRIPT_LEAF_VERSION, internal, Parity::Even, proof.clone());
        let bytes = even.to_bytes();
        assert_eq!(bytes.len(), 97);
        assert_eq!(even.size(), 97);
        assert_eq!(bytes[0], 0xc0);
        assert_eq!(&bytes[1..33], &internal.serialize());
        assert_eq!(&bytes[33..65], &[0xaa; 32]);
        assert_eq!(&bytes[65..97], &[0xbb; 32]);

        let odd = ControlBlock::new(TAPSCRIPT_LEAF_VERSION, internal, Parity::Odd, proof);
        assert_eq!(odd.to_bytes()[0], 0xc1);
    }

    #[test]
    fn test_empty_proof_is_33_bytes() {
        let internal = unspendable_internal_key().unwrap();
        let block =
            ControlBlock::from_parts(TAPSCRIPT_LEAF_VERSION, internal, Parity::Even, &[]).unwrap();
        assert_eq!(block.to_bytes().len(), 33);
        assert!(block.merkle_proof().is_empty());
    }

    #[test]
    fn test_from_parts_rejects_malformed_input() {
        let internal = unspendable_internal_key().unwrap();
        assert!(matches!(
            ControlBlock::from_parts(TAPSCRIPT_LEAF_VERSION, internal, Parity::Even, &[0u8; 31]),
            Err(StakingError::InvalidParameter { .. })
        ));
        assert!(ControlBlock::from_parts(0xc1, internal, Parity::Even, &[]).is_err());
    }

    #[test]
    fn test_odd_leaf_version_would_hide_parity() {
        let internal = unspendable_internal_key().unwrap();
        // 0xc1 | Even and 0xc0 | Odd would pack to the same first byte
        let err = ControlBlock::from_parts(0xc1, internal, Parity::Even, &[0u8; 32]).unwrap_err();
        assert!(err.to_string().contains("parity bit"));

        let block = ControlBlock::from_parts(0xc0, internal, Parity::Odd, &[0u8; 32]).unwrap();
        assert_eq!(block.to_bytes()[0], 0xc1);
        assert_eq!(block.leaf_version(), 0xc0);
    }

    #[test]
    fn test_serializations_do_not_share_buffers() {
        let internal = unspendable_internal_key().unwrap();
        let block = ControlBlock::new(
            TAPSCRIPT_LEAF_VERSION,
            internal,
            Parity::Odd,
            MerkleProof::from_bytes(TapHash::from_byte_array([1u8; 32]).as_bytes()).unwrap(),
        );

        let mut first = block.to_bytes();
        first[0] = 0;
        assert_eq!(block.to_bytes()[0], 0xc1);
    }
}
