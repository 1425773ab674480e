//! # Staking Output Assembly
//!
//! Combines leaf scripts, tree, tweak and control blocks into the three outputs
//! of the staking protocol:
//!
//! | Output                  | Leaves                          | Lock used        |
//! |-------------------------|---------------------------------|------------------|
//! | Staking                 | time lock, unbonding, slashing  | staking time     |
//! | Unbonding               | time lock, slashing             | unbonding time   |
//! | Slashing change         | time lock                       | unbonding time   |
//!
//! Every output shares the same unspendable internal key, so the only way to
//! spend any of them is through one of the revealed leaves.

use crate::error::{StakingError, StakingResult};
use crate::hashes::TapHash;
use crate::scripts::{timelock_script, RelativeLock, StakingScripts};
use crate::taptree::{TapLeaf, TapTree};
use crate::tweak::{tweak, unspendable_internal_key, TweakedKey};
use crate::control_block::ControlBlock;
use bitcoin::{
    key::TweakedPublicKey,
    secp256k1::{Secp256k1, VerifyOnly, XOnlyPublicKey},
    Amount, Script, ScriptBuf, TxOut,
};

/// A leaf script and the control block that proves its inclusion.
///
/// Together with the signatures the script asks for, these form the witness
/// an external signer needs to spend through this path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendInfo {
    leaf: TapLeaf,
    control_block: ControlBlock,
}

impl SpendInfo {
    pub fn script(&self) -> &Script {
        self.leaf.script()
    }

    pub fn leaf(&self) -> &TapLeaf {
        &self.leaf
    }

    pub fn leaf_hash(&self) -> TapHash {
        self.leaf.hash()
    }

    pub fn control_block(&self) -> &ControlBlock {
        &self.control_block
    }
}

/// A script tree committed into an output key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaprootCommitment {
    internal_key: XOnlyPublicKey,
    tree: TapTree,
    tweaked: TweakedKey,
}

impl TaprootCommitment {
    fn new(
        secp: &Secp256k1<VerifyOnly>,
        internal_key: XOnlyPublicKey,
        scripts: Vec<ScriptBuf>,
    ) -> StakingResult<Self> {
        let leaves = scripts.into_iter().map(TapLeaf::new).collect();
        let tree = TapTree::assemble(leaves)?;
        let tweaked = tweak(secp, &internal_key, &tree.root())?;

        Ok(Self {
            internal_key,
            tree,
            tweaked,
        })
    }

    pub fn internal_key(&self) -> XOnlyPublicKey {
        self.internal_key
    }

    pub fn tree(&self) -> &TapTree {
        &self.tree
    }

    pub fn merkle_root(&self) -> TapHash {
        self.tree.root()
    }

    pub fn tweaked_key(&self) -> TweakedKey {
        self.tweaked
    }

    pub fn output_key(&self) -> XOnlyPublicKey {
        self.tweaked.output_key()
    }

    /// Witness v1 program: `OP_1 <32-byte output key>`
    pub fn pk_script(&self) -> ScriptBuf {
        ScriptBuf::new_p2tr_tweaked(TweakedPublicKey::dangerous_assume_tweaked(
            self.tweaked.output_key(),
        ))
    }

    /// Resolve the script and control block for the leaf with hash `leaf_hash`.
    pub fn spend_info(&self, leaf_hash: &TapHash) -> StakingResult<SpendInfo> {
        let index = self.tree.leaf_index(leaf_hash).ok_or_else(|| {
            StakingError::param(format!("leaf {} is not part of the script tree", leaf_hash))
        })?;
        Ok(self.spend_info_at(index))
    }

    /// Spend info for every leaf, in the order the scripts were supplied.
    pub fn spend_infos(&self) -> Vec<SpendInfo> {
        (0..self.tree.len()).map(|index| self.spend_info_at(index)).collect()
    }

    fn spend_info_at(&self, index: usize) -> SpendInfo {
        let leaf = self.tree.leaves()[index].clone();
        let proof = self.tree.proof(index).cloned().unwrap_or_default();
        let control_block =
            ControlBlock::new(leaf.version(), self.internal_key, self.tweaked.parity(), proof);
        SpendInfo {
            leaf,
            control_block,
        }
    }
}

/// The staking output with its time lock, unbonding and slashing paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingInfo {
    staking_output: TxOut,
    commitment: TaprootCommitment,
    time_lock_path_leaf_hash: TapHash,
    unbonding_path_leaf_hash: TapHash,
    slashing_path_leaf_hash: TapHash,
}

impl StakingInfo {
    pub fn staking_output(&self) -> &TxOut {
        &self.staking_output
    }

    pub fn value(&self) -> Amount {
        self.staking_output.value
    }

    pub fn pk_script(&self) -> &Script {
        &self.staking_output.script_pubkey
    }

    pub fn output_key(&self) -> XOnlyPublicKey {
        self.commitment.output_key()
    }

    pub fn commitment(&self) -> &TaprootCommitment {
        &self.commitment
    }

    pub fn time_lock_path_spend_info(&self) -> StakingResult<SpendInfo> {
        self.commitment.spend_info(&self.time_lock_path_leaf_hash)
    }

    pub fn unbonding_path_spend_info(&self) -> StakingResult<SpendInfo> {
        self.commitment.spend_info(&self.unbonding_path_leaf_hash)
    }

    pub fn slashing_path_spend_info(&self) -> StakingResult<SpendInfo> {
        self.commitment.spend_info(&self.slashing_path_leaf_hash)
    }
}

/// The unbonding output with its time lock and slashing paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnbondingInfo {
    unbonding_output: TxOut,
    commitment: TaprootCommitment,
    time_lock_path_leaf_hash: TapHash,
    slashing_path_leaf_hash: TapHash,
}

impl UnbondingInfo {
    pub fn unbonding_output(&self) -> &TxOut {
        &self.unbonding_output
    }

    pub fn value(&self) -> Amount {
        self.unbonding_output.value
    }

    pub fn pk_script(&self) -> &Script {
        &self.unbonding_output.script_pubkey
    }

    pub fn output_key(&self) -> XOnlyPublicKey {
        self.commitment.output_key()
    }

    pub fn commitment(&self) -> &TaprootCommitment {
        &self.commitment
    }

    pub fn time_lock_path_spend_info(&self) -> StakingResult<SpendInfo> {
        self.commitment.spend_info(&self.time_lock_path_leaf_hash)
    }

    pub fn slashing_path_spend_info(&self) -> StakingResult<SpendInfo> {
        self.commitment.spend_info(&self.slashing_path_leaf_hash)
    }
}

/// Change destination of a slashing transaction: the staker's share, time locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashingChangeOutput {
    pk_script: ScriptBuf,
    lock: RelativeLock,
    commitment: TaprootCommitment,
    spend_info: SpendInfo,
}

impl SlashingChangeOutput {
    pub fn pk_script(&self) -> &Script {
        &self.pk_script
    }

    pub fn lock_blocks(&self) -> u16 {
        self.lock.blocks()
    }

    pub fn output_key(&self) -> XOnlyPublicKey {
        self.commitment.output_key()
    }

    pub fn commitment(&self) -> &TaprootCommitment {
        &self.commitment
    }

    pub fn spend_info(&self) -> &SpendInfo {
        &self.spend_info
    }
}

/// Builds staking protocol outputs over a fixed internal key.
///
/// The builder only holds immutable data, so one instance can be shared across
/// threads building outputs for many stakers.
#[derive(Debug, Clone)]
pub struct TaprootOutputBuilder {
    secp: Secp256k1<VerifyOnly>,
    internal_key: XOnlyPublicKey,
}

impl TaprootOutputBuilder {
    /// Builder over the protocol's unspendable internal key
    pub fn new() -> StakingResult<Self> {
        Ok(Self::with_internal_key(unspendable_internal_key()?))
    }

    /// Builder over a caller-chosen internal key
    pub fn with_internal_key(internal_key: XOnlyPublicKey) -> Self {
        Self {
            secp: Secp256k1::verification_only(),
            internal_key,
        }
    }

    pub fn internal_key(&self) -> XOnlyPublicKey {
        self.internal_key
    }

    pub fn secp(&self) -> &Secp256k1<VerifyOnly> {
        &self.secp
    }

    /// Build the three-leaf staking output.
    pub fn build_staking_info(
        &self,
        staker_key: &XOnlyPublicKey,
        fp_keys: &[XOnlyPublicKey],
        covenant_keys: &[XOnlyPublicKey],
        covenant_quorum: u32,
        staking_time_blocks: u32,
        staking_amount: Amount,
    ) -> StakingResult<StakingInfo> {
        require_positive(staking_amount, "staking")?;
        let scripts = StakingScripts::new(
            staker_key,
            fp_keys,
            covenant_keys,
            covenant_quorum,
            staking_time_blocks,
        )?;

        let time_lock_path_leaf_hash = TapLeaf::new(scripts.time_lock.clone()).hash();
        let unbonding_path_leaf_hash = TapLeaf::new(scripts.unbonding.clone()).hash();
        let slashing_path_leaf_hash = TapLeaf::new(scripts.slashing.clone()).hash();

        let commitment = TaprootCommitment::new(
            &self.secp,
            self.internal_key,
            vec![scripts.time_lock, scripts.unbonding, scripts.slashing],
        )?;
        log::debug!(
            "built staking output {} for {} (root {})",
            commitment.output_key(),
            staking_amount,
            commitment.merkle_root()
        );

        Ok(StakingInfo {
            staking_output: TxOut {
                value: staking_amount,
                script_pubkey: commitment.pk_script(),
            },
            commitment,
            time_lock_path_leaf_hash,
            unbonding_path_leaf_hash,
            slashing_path_leaf_hash,
        })
    }

    /// Build the two-leaf unbonding output, locked by the unbonding time.
    pub fn build_unbonding_info(
        &self,
        staker_key: &XOnlyPublicKey,
        fp_keys: &[XOnlyPublicKey],
        covenant_keys: &[XOnlyPublicKey],
        covenant_quorum: u32,
        unbonding_time_blocks: u32,
        unbonding_amount: Amount,
    ) -> StakingResult<UnbondingInfo> {
        require_positive(unbonding_amount, "unbonding")?;
        let scripts = StakingScripts::new(
            staker_key,
            fp_keys,
            covenant_keys,
            covenant_quorum,
            unbonding_time_blocks,
        )?;

        let time_lock_path_leaf_hash = TapLeaf::new(scripts.time_lock.clone()).hash();
        let slashing_path_leaf_hash = TapLeaf::new(scripts.slashing.clone()).hash();

        let commitment = TaprootCommitment::new(
            &self.secp,
            self.internal_key,
            vec![scripts.time_lock, scripts.slashing],
        )?;
        log::debug!(
            "built unbonding output {} for {} (root {})",
            commitment.output_key(),
            unbonding_amount,
            commitment.merkle_root()
        );

        Ok(UnbondingInfo {
            unbonding_output: TxOut {
                value: unbonding_amount,
                script_pubkey: commitment.pk_script(),
            },
            commitment,
            time_lock_path_leaf_hash,
            slashing_path_leaf_hash,
        })
    }

    /// Build the single-leaf change output used inside slashing transactions.
    pub fn build_slashing_change_output(
        &self,
        staker_key: &XOnlyPublicKey,
        lock_blocks: u32,
    ) -> StakingResult<SlashingChangeOutput> {
        let lock = RelativeLock::new(lock_blocks)?;
        let script = timelock_script(staker_key, lock);

        let commitment = TaprootCommitment::new(&self.secp, self.internal_key, vec![script])?;
        let spend_info = commitment.spend_info_at(0);
        log::debug!(
            "built slashing change output {} locked for {} blocks",
            commitment.output_key(),
            lock.blocks()
        );

        Ok(SlashingChangeOutput {
            pk_script: commitment.pk_script(),
            lock,
            commitment,
            spend_info,
        })
    }
}

fn require_positive(amount: Amount, what: &str) -> StakingResult<()> {
    if amount == Amount::ZERO {
        return Err(StakingError::param(format!("{} amount must be positive", what)));
    }
    Ok(())
}
