//! # Output Key Tweaking
//!
//! `Q = P + int(TaggedHash("TapTweak", x(P) || root)) * G`
//!
//! `P` is the even-y lift of the x-only internal key. The parity of `Q` is not
//! part of the witness program, but it must be packed into every control block.

use crate::config::protocol::UNSPENDABLE_KEY_PATH_BYTES;
use crate::error::{StakingError, StakingResult};
use crate::hashes::{tweak_hash, TapHash};
use bitcoin::secp256k1::{Parity, Scalar, Secp256k1, Verification, XOnlyPublicKey};

/// The fixed internal key that makes key-path spending impossible.
pub fn unspendable_internal_key() -> StakingResult<XOnlyPublicKey> {
    XOnlyPublicKey::from_slice(&UNSPENDABLE_KEY_PATH_BYTES).map_err(|e| {
        StakingError::public_key(hex::encode(UNSPENDABLE_KEY_PATH_BYTES), e.to_string())
    })
}

/// An output key together with the y-parity of the tweaked point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweakedKey {
    output_key: XOnlyPublicKey,
    parity: Parity,
}

impl TweakedKey {
    pub fn output_key(&self) -> XOnlyPublicKey {
        self.output_key
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    /// Check `Q == P + t*G` for the given internal key and Merkle root.
    pub fn verify<C: Verification>(
        &self,
        secp: &Secp256k1<C>,
        internal_key: &XOnlyPublicKey,
        merkle_root: &TapHash,
    ) -> bool {
        match tweak_scalar(internal_key, merkle_root) {
            Ok(scalar) => internal_key.tweak_add_check(secp, &self.output_key, self.parity, scalar),
            Err(_) => false,
        }
    }
}

/// The tweak scalar committing `internal_key` to `merkle_root`.
pub fn tweak_scalar(internal_key: &XOnlyPublicKey, merkle_root: &TapHash) -> StakingResult<Scalar> {
    scalar_from_hash(tweak_hash(internal_key, merkle_root))
}

fn scalar_from_hash(bytes: [u8; 32]) -> StakingResult<Scalar> {
    if bytes == [0u8; 32] {
        return Err(StakingError::tweak("tweak scalar is zero"));
    }
    Scalar::from_be_bytes(bytes)
        .map_err(|_| StakingError::tweak("tweak scalar is not below the curve order"))
}

/// Tweak `internal_key` with the tree root, producing the output key and parity.
pub fn tweak<C: Verification>(
    secp: &Secp256k1<C>,
    internal_key: &XOnlyPublicKey,
    merkle_root: &TapHash,
) -> StakingResult<TweakedKey> {
    let scalar = tweak_scalar(internal_key, merkle_root)?;
    apply_tweak(secp, internal_key, &scalar)
}

fn apply_tweak<C: Verification>(
    secp: &Secp256k1<C>,
    internal_key: &XOnlyPublicKey,
    scalar: &Scalar,
) -> StakingResult<TweakedKey> {
    let (output_key, parity) = internal_key
        .add_tweak(secp, scalar)
        .map_err(|e| StakingError::tweak(format!("tweaked point is invalid: {}", e)))?;

    log::trace!("tweaked internal key {} to {} ({:?} parity)", internal_key, output_key, parity);
    Ok(TweakedKey { output_key, parity })
}
