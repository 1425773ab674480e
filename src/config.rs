//! # Configuration Constants
//!
//! Protocol constants shared by every network, plus the defaults and environment
//! overrides used by the parameter-fetch layer.

/// Network and API configuration
pub mod network {
    use std::time::Duration;

    /// Default staking API endpoint serving the versioned staking parameters
    pub const DEFAULT_PARAMS_API_URL: &str = "https://staking-api.babylonlabs.io/v2/network-info";

    /// Default endpoint listing registered finality providers
    pub const DEFAULT_PROVIDERS_API_URL: &str =
        "https://babylon.nodes.guru/babylon/btcstaking/v1/finality_providers";

    /// Request timeout for network operations
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Taproot and staking protocol constants
///
/// These values are consensus-relevant: staker, covenant signer, wallet and
/// auditor must all agree on them bit-for-bit.
pub mod protocol {
    /// X-only internal key with no known discrete logarithm.
    ///
    /// This is the BIP-341 `H` point, obtained by hashing the uncompressed
    /// secp256k1 generator. Using it as the internal key disables key-path
    /// spending, so every staking output is script-path only:
    /// `50929b74c1a04954b78b4b6035e97a5e078a5a0f28ec96d547bfee9ace803ac0`
    pub const UNSPENDABLE_KEY_PATH_BYTES: [u8; 32] = [
        0x50, 0x92, 0x9b, 0x74, 0xc1, 0xa0, 0x49, 0x54, 0xb7, 0x8b, 0x4b, 0x60, 0x35, 0xe9, 0x7a, 0x5e,
        0x07, 0x8a, 0x5a, 0x0f, 0x28, 0xec, 0x96, 0xd5, 0x47, 0xbf, 0xee, 0x9a, 0xce, 0x80, 0x3a, 0xc0,
    ];

    /// BIP-342 tapscript leaf version
    pub const TAPSCRIPT_LEAF_VERSION: u8 = 0xc0;

    /// Maximum Merkle path length accepted in a control block
    pub const MAX_TAPROOT_DEPTH: usize = 128;

    /// Largest block-based relative lock expressible in a BIP-68 sequence
    pub const MAX_RELATIVE_LOCK_BLOCKS: u32 = u16::MAX as u32;

    /// Average block interval used when describing lock durations
    pub const BLOCK_INTERVAL_MINUTES: f64 = 10.0;
}

/// Environment variable names
pub mod env {
    /// Staking parameters API URL override
    pub const PARAMS_API_URL: &str = "STAKING_PARAMS_API_URL";

    /// Finality provider API URL override
    pub const PROVIDERS_API_URL: &str = "STAKING_PROVIDERS_API_URL";
}
