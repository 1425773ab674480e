//! # Public Key Parsing
//!
//! Keys arrive from the command line and the parameters API as hex strings in
//! either compressed (33 bytes, `02`/`03` prefix) or x-only (32 bytes) form.
//! Scripts only ever embed the x-only form.

use crate::error::{StakingError, StakingResult};
use bitcoin::secp256k1::{PublicKey, XOnlyPublicKey};

/// Parse a compressed or x-only hex public key into its x-only form.
pub fn parse_public_key(hex_str: &str) -> StakingResult<XOnlyPublicKey> {
    let trimmed = hex_str.trim();
    let bytes = hex::decode(trimmed)
        .map_err(|e| StakingError::public_key(trimmed, format!("invalid hex: {}", e)))?;

    match bytes.len() {
        33 => PublicKey::from_slice(&bytes)
            .map(|key| key.x_only_public_key().0)
            .map_err(|e| StakingError::public_key(trimmed, e.to_string())),
        32 => XOnlyPublicKey::from_slice(&bytes)
            .map_err(|e| StakingError::public_key(trimmed, e.to_string())),
        len => Err(StakingError::public_key(
            trimmed,
            format!("expected 32 or 33 bytes, got {}", len),
        )),
    }
}

/// Parse every key in `hex_keys`, failing on the first invalid one.
pub fn parse_public_keys<S: AsRef<str>>(hex_keys: &[S]) -> StakingResult<Vec<XOnlyPublicKey>> {
    hex_keys
        .iter()
        .map(|key| parse_public_key(key.as_ref()))
        .collect()
}

/// Hex of the 32-byte x-only serialization
pub fn to_hex(key: &XOnlyPublicKey) -> String {
    hex::encode(key.serialize())
}
