//! # Error Types for Staking Output Construction
//!
//! Core construction failures (scripts, tree, tweak) are deterministic functions
//! of the input and are never retried. Network and decoding failures only occur
//! in the parameter-fetch layer wrapped around the core.

use thiserror::Error;

/// Main error type for all staking-output operations
#[derive(Debug, Error)]
pub enum StakingError {
    /// Out-of-range lock value, empty key set, bad quorum, duplicate keys
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Script tree assembly was given no leaves
    #[error("Cannot assemble a script tree without leaves")]
    EmptyTree,

    /// Degenerate Taproot tweak (zero or out-of-range scalar, point at infinity)
    #[error("Invalid taproot tweak: {message}")]
    InvalidTweak { message: String },

    /// Public key string could not be decoded
    #[error("Invalid public key {key}: {reason}")]
    InvalidPublicKey { key: String, reason: String },

    /// Requested stake falls outside the network's parameter bounds
    #[error("Staking {field} {value} is outside the allowed range [{min}, {max}]")]
    StakeOutOfBounds {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    /// The parameter response carried no versioned parameter set
    #[error("No staking parameter versions found in API response")]
    MissingParams,

    /// Network request failures (params API, provider API)
    #[error("Network request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON processing error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Non-success HTTP status from an API endpoint
    #[error("API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
}

/// Result type alias for staking-output operations
pub type StakingResult<T> = Result<T, StakingError>;

impl StakingError {
    /// Create an invalid parameter error with a message
    pub fn param(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create an invalid tweak error with a message
    pub fn tweak(message: impl Into<String>) -> Self {
        Self::InvalidTweak {
            message: message.into(),
        }
    }

    /// Create an invalid public key error
    pub fn public_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPublicKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is retryable (network/temporary issues)
    pub fn is_retryable(&self) -> bool {
        matches!(self, StakingError::Network { .. })
    }

    /// Check if this error can only be fixed by correcting the caller's input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            StakingError::InvalidParameter { .. }
                | StakingError::EmptyTree
                | StakingError::InvalidTweak { .. }
                | StakingError::InvalidPublicKey { .. }
                | StakingError::StakeOutOfBounds { .. }
        )
    }
}
