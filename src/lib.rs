//! # BTC Staking Taproot Outputs
//!
//! Deterministic construction of the Taproot outputs used by covenant-secured
//! BTC staking: the staking output, the unbonding output and the slashing change
//! output, together with the leaf script and control block for every spending path.
//!
//! ## Construction Pipeline
//!
//! ```text
//! ┌───────────────┐   ┌─────────┐   ┌─────────┐   ┌─────────────┐   ┌────────────────┐
//! │ ScriptBuilder │──>│ TapLeaf │──>│ TapTree │──>│ KeyTweaker  │──>│ Control blocks │
//! │   (scripts)   │   │ (x1..3) │   │ (root)  │   │ (Q, parity) │   │   + TxOut      │
//! └───────────────┘   └─────────┘   └─────────┘   └─────────────┘   └────────────────┘
//! ```
//!
//! Every output uses the same unspendable internal key, so key-path spending is
//! impossible and all spends go through a revealed leaf.
//!
//! ## Module Structure
//!
//! - [`scripts`]: time lock, unbonding and slashing leaf scripts
//! - [`hashes`]: BIP-340 tagged hashes for leaves, branches and tweaks
//! - [`taptree`]: leaf hashing, sort-by-hash tree assembly and Merkle proofs
//! - [`tweak`]: output key tweaking and parity
//! - [`control_block`]: control block packing and verification
//! - [`outputs`]: staking, unbonding and slashing change output assembly
//! - [`params`], [`providers`], [`services`]: staking API data and clients
//! - [`report`]: hex/bech32m report of a stake's outputs
//! - [`config`], [`error`], [`keys`]: constants, error types and key parsing
//!
//! ## Example
//!
//! ```no_run
//! use btc_staking_taproot::{keys::parse_public_key, TaprootOutputBuilder};
//! use bitcoin::Amount;
//!
//! # fn main() -> Result<(), btc_staking_taproot::StakingError> {
//! let staker = parse_public_key("d45c70d28f169e1f0c7f4a78e2bc73497afe585b70aa897955989068f3350aaa")?;
//! let fp = parse_public_key("4b15848e495a3a62283daaadb3f458a00859fe48e321f0121ebabbdd6698f9fa")?;
//! let covenant = parse_public_key("fa9d882d45f4060bdb8042183828cd87544f1ea997380e586cab77d5fd698737")?;
//!
//! let builder = TaprootOutputBuilder::new()?;
//! let staking = builder.build_staking_info(&staker, &[fp], &[covenant], 1, 64_000, Amount::from_sat(1_000_000))?;
//! assert_eq!(staking.pk_script().len(), 34);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod control_block;
pub mod error;
pub mod hashes;
pub mod keys;
pub mod outputs;
pub mod params;
pub mod providers;
pub mod report;
pub mod scripts;
pub mod services;
pub mod taptree;
pub mod tweak;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use control_block::ControlBlock;
pub use error::{StakingError, StakingResult};
pub use hashes::TapHash;
pub use outputs::{SlashingChangeOutput, SpendInfo, StakingInfo, TaprootOutputBuilder, UnbondingInfo};
pub use params::{NetworkInfo, VersionedParams};
pub use report::{OutputsReport, StakeRequest};
pub use taptree::{MerkleProof, TapLeaf, TapTree};
pub use tweak::TweakedKey;
