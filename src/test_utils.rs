//! Deterministic keys for unit tests.

use bitcoin::secp256k1::{Keypair, Secp256k1, SecretKey, XOnlyPublicKey};

/// X-only public key for the secret `[seed; 32]`. `seed` must be non-zero.
pub fn xonly_key(seed: u8) -> XOnlyPublicKey {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&[seed; 32]).expect("non-zero seed is a valid secret");
    Keypair::from_secret_key(&secp, &secret).x_only_public_key().0
}
