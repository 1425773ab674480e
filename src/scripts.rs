//! # Staking Leaf Scripts
//!
//! Builds the three tapscript leaves committed into every staking output:
//!
//! ```text
//! time lock:  <staker> OP_CHECKSIGVERIFY <lock_blocks> OP_CHECKSEQUENCEVERIFY
//! unbonding:  <staker> OP_CHECKSIGVERIFY <covenant quorum>
//! slashing:   <staker> OP_CHECKSIGVERIFY <fp 1-of-n VERIFY> <covenant quorum>
//! ```
//!
//! Quorum structures over more than one key are encoded as a `CHECKSIGADD`
//! accumulator over the keys sorted by their x-only bytes:
//!
//! ```text
//! <k1> OP_CHECKSIG <k2> OP_CHECKSIGADD ... <kn> OP_CHECKSIGADD <m> OP_NUMEQUAL
//! ```
//!
//! A single-key set collapses to `<k> OP_CHECKSIG`. Sorting makes the script
//! bytes independent of the order keys were supplied in.

use crate::config::protocol::MAX_RELATIVE_LOCK_BLOCKS;
use crate::error::{StakingError, StakingResult};
use bitcoin::{
    opcodes::all::*, script::Builder, secp256k1::XOnlyPublicKey, ScriptBuf, Sequence,
};

/// A block-based relative lock (BIP-68/112), in the range `1..=65535`.
///
/// Time-based locks are not representable, so the BIP-68 seconds flag is never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativeLock(u16);

impl RelativeLock {
    /// Validate a block count coming from the caller.
    pub fn new(blocks: u32) -> StakingResult<Self> {
        if blocks == 0 || blocks > MAX_RELATIVE_LOCK_BLOCKS {
            return Err(StakingError::param(format!(
                "relative lock must be between 1 and {} blocks, got {}",
                MAX_RELATIVE_LOCK_BLOCKS, blocks
            )));
        }
        Ok(Self(blocks as u16))
    }

    pub fn blocks(&self) -> u16 {
        self.0
    }

    /// The input sequence a spender must set to satisfy this lock
    pub fn to_sequence(&self) -> Sequence {
        Sequence::from_height(self.0)
    }
}

/// `<staker> OP_CHECKSIGVERIFY <lock_blocks> OP_CHECKSEQUENCEVERIFY`
pub fn build_timelock_script(
    staker_key: &XOnlyPublicKey,
    lock_blocks: u32,
) -> StakingResult<ScriptBuf> {
    let lock = RelativeLock::new(lock_blocks)?;
    Ok(timelock_script(staker_key, lock))
}

pub(crate) fn timelock_script(staker_key: &XOnlyPublicKey, lock: RelativeLock) -> ScriptBuf {
    Builder::new()
        .push_x_only_key(staker_key)
        .push_opcode(OP_CHECKSIGVERIFY)
        .push_int(i64::from(lock.blocks()))
        .push_opcode(OP_CSV)
        .into_script()
}

/// Staker signature followed by the covenant committee quorum.
pub fn build_unbonding_script(
    staker_key: &XOnlyPublicKey,
    covenant_keys: &[XOnlyPublicKey],
    covenant_quorum: u32,
) -> StakingResult<ScriptBuf> {
    let builder = push_single_key(Builder::new(), staker_key, true);
    let builder = push_quorum(builder, covenant_keys, covenant_quorum, false, "covenant")?;
    Ok(builder.into_script())
}

/// Staker signature, one finality provider signature, then the covenant quorum.
pub fn build_slashing_script(
    staker_key: &XOnlyPublicKey,
    fp_keys: &[XOnlyPublicKey],
    covenant_keys: &[XOnlyPublicKey],
    covenant_quorum: u32,
) -> StakingResult<ScriptBuf> {
    let builder = push_single_key(Builder::new(), staker_key, true);
    let builder = push_quorum(builder, fp_keys, 1, true, "finality provider")?;
    let builder = push_quorum(builder, covenant_keys, covenant_quorum, false, "covenant")?;
    Ok(builder.into_script())
}

fn push_single_key(builder: Builder, key: &XOnlyPublicKey, with_verify: bool) -> Builder {
    let op = if with_verify { OP_CHECKSIGVERIFY } else { OP_CHECKSIG };
    builder.push_x_only_key(key).push_opcode(op)
}

fn push_quorum(
    builder: Builder,
    keys: &[XOnlyPublicKey],
    threshold: u32,
    with_verify: bool,
    role: &str,
) -> StakingResult<Builder> {
    if keys.is_empty() {
        return Err(StakingError::param(format!("no {} keys provided", role)));
    }
    if threshold == 0 {
        return Err(StakingError::param(format!("{} quorum must be at least 1", role)));
    }
    if threshold as usize > keys.len() {
        return Err(StakingError::param(format!(
            "{} quorum {} exceeds the number of keys {}",
            role,
            threshold,
            keys.len()
        )));
    }

    if let [key] = keys {
        return Ok(push_single_key(builder, key, with_verify));
    }

    let sorted = sorted_unique_keys(keys, role)?;
    let mut builder = builder;
    for (i, key) in sorted.iter().enumerate() {
        let op = if i == 0 { OP_CHECKSIG } else { OP_CHECKSIGADD };
        builder = builder.push_x_only_key(key).push_opcode(op);
    }

    let op = if with_verify { OP_NUMEQUALVERIFY } else { OP_NUMEQUAL };
    Ok(builder.push_int(i64::from(threshold)).push_opcode(op))
}

/// Sort keys by their 32-byte x-only serialization and reject duplicates.
pub fn sorted_unique_keys(keys: &[XOnlyPublicKey], role: &str) -> StakingResult<Vec<XOnlyPublicKey>> {
    let mut sorted = keys.to_vec();
    sorted.sort_by_key(|key| key.serialize());

    if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(StakingError::param(format!(
            "duplicate {} key {}",
            role, pair[0]
        )));
    }
    Ok(sorted)
}

/// The three staking leaf scripts built from one consistent key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingScripts {
    pub time_lock: ScriptBuf,
    pub unbonding: ScriptBuf,
    pub slashing: ScriptBuf,
}

impl StakingScripts {
    /// Build all three scripts, rejecting key sets where one party appears in
    /// more than one role.
    pub fn new(
        staker_key: &XOnlyPublicKey,
        fp_keys: &[XOnlyPublicKey],
        covenant_keys: &[XOnlyPublicKey],
        covenant_quorum: u32,
        lock_blocks: u32,
    ) -> StakingResult<Self> {
        let lock = RelativeLock::new(lock_blocks)?;
        check_disjoint_roles(staker_key, fp_keys, covenant_keys)?;

        Ok(Self {
            time_lock: timelock_script(staker_key, lock),
            unbonding: build_unbonding_script(staker_key, covenant_keys, covenant_quorum)?,
            slashing: build_slashing_script(staker_key, fp_keys, covenant_keys, covenant_quorum)?,
        })
    }
}

fn check_disjoint_roles(
    staker_key: &XOnlyPublicKey,
    fp_keys: &[XOnlyPublicKey],
    covenant_keys: &[XOnlyPublicKey],
) -> StakingResult<()> {
    if fp_keys.contains(staker_key) {
        return Err(StakingError::param("staker key is also a finality provider key"));
    }
    if covenant_keys.contains(staker_key) {
        return Err(StakingError::param("staker key is also a covenant key"));
    }
    if let Some(key) = fp_keys.iter().find(|key| covenant_keys.contains(key)) {
        return Err(StakingError::param(format!(
            "finality provider key {} is also a covenant key",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::xonly_key;

    fn push32(key: &XOnlyPublicKey) -> Vec<u8> {
        let mut bytes = vec![0x20];
        bytes.extend_from_slice(&key.serialize());
        bytes
    }

    #[test]
    fn test_timelock_script_bytes() {
        let staker = xonly_key(1);
        let script = build_timelock_script(&staker, 64_000).unwrap();

        let mut expected = push32(&staker);
        expected.push(0xad); // OP_CHECKSIGVERIFY
        // 64000 = 0xfa00, needs a sign byte: push 3 bytes 00 fa 00
        expected.extend_from_slice(&[0x03, 0x00, 0xfa, 0x00]);
        expected.push(0xb2); // OP_CHECKSEQUENCEVERIFY
        assert_eq!(script.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_timelock_script_uses_minimal_push() {
        let staker = xonly_key(1);

        let small = build_timelock_script(&staker, 16).unwrap();
        assert_eq!(small.as_bytes()[34], 0x60); // OP_16

        let medium = build_timelock_script(&staker, 150).unwrap();
        assert_eq!(&medium.as_bytes()[34..37], &[0x02, 0x96, 0x00]);

        let max = build_timelock_script(&staker, 65_535).unwrap();
        assert_eq!(&max.as_bytes()[34..38], &[0x03, 0xff, 0xff, 0x00]);
    }

    #[test]
    fn test_relative_lock_bounds() {
        let staker = xonly_key(1);
        assert!(matches!(
            build_timelock_script(&staker, 0),
            Err(StakingError::InvalidParameter { .. })
        ));
        assert!(matches!(
            build_timelock_script(&staker, 65_536),
            Err(StakingError::InvalidParameter { .. })
        ));

        let lock = RelativeLock::new(144).unwrap();
        assert_eq!(lock.blocks(), 144);
        assert!(lock.to_sequence().is_height_locked());
        assert_eq!(lock.to_sequence().0, 144);
    }

    #[test]
    fn test_unbonding_script_sorts_covenant_keys() {
        let staker = xonly_key(1);
        let covenants = vec![xonly_key(10), xonly_key(11), xonly_key(12)];
        let sorted = sorted_unique_keys(&covenants, "covenant").unwrap();

        let script = build_unbonding_script(&staker, &covenants, 2).unwrap();

        let mut expected = push32(&staker);
        expected.push(0xad); // OP_CHECKSIGVERIFY
        expected.extend(push32(&sorted[0]));
        expected.push(0xac); // OP_CHECKSIG
        expected.extend(push32(&sorted[1]));
        expected.push(0xba); // OP_CHECKSIGADD
        expected.extend(push32(&sorted[2]));
        expected.push(0xba);
        expected.push(0x52); // OP_2
        expected.push(0x9c); // OP_NUMEQUAL
        assert_eq!(script.as_bytes(), expected.as_slice());

        let reversed: Vec<_> = covenants.iter().rev().copied().collect();
        assert_eq!(build_unbonding_script(&staker, &reversed, 2).unwrap(), script);
    }

    #[test]
    fn test_slashing_script_layout() {
        let staker = xonly_key(1);
        let fp = xonly_key(2);
        let covenant = xonly_key(10);

        let script = build_slashing_script(&staker, &[fp], &[covenant], 1).unwrap();

        let mut expected = push32(&staker);
        expected.push(0xad);
        expected.extend(push32(&fp));
        expected.push(0xad); // single fp key in verify form
        expected.extend(push32(&covenant));
        expected.push(0xac); // single covenant key, non-verify
        assert_eq!(script.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_multiple_fp_keys_use_verify_quorum() {
        let staker = xonly_key(1);
        let fps = vec![xonly_key(2), xonly_key(3)];
        let covenants = vec![xonly_key(10), xonly_key(11)];

        let script = build_slashing_script(&staker, &fps, &covenants, 2).unwrap();
        let bytes = script.as_bytes();

        // staker(34) + fp1(34) + fp2(34) + OP_1 + OP_NUMEQUALVERIFY
        assert_eq!(bytes[34 + 68], 0x51);
        assert_eq!(bytes[34 + 68 + 1], 0x9d);
        assert_eq!(*bytes.last().unwrap(), 0x9c);
    }

    #[test]
    fn test_fp_key_order_does_not_change_slashing_script() {
        let staker = xonly_key(1);
        let (fp_a, fp_b, fp_c) = (xonly_key(2), xonly_key(3), xonly_key(4));
        let covenants = vec![xonly_key(10), xonly_key(11)];

        let forward = build_slashing_script(&staker, &[fp_a, fp_b, fp_c], &covenants, 2).unwrap();
        let backward = build_slashing_script(&staker, &[fp_c, fp_b, fp_a], &covenants, 2).unwrap();
        let rotated = build_slashing_script(&staker, &[fp_b, fp_c, fp_a], &covenants, 2).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);

        let sorted = sorted_unique_keys(&[fp_a, fp_b, fp_c], "finality provider").unwrap();
        assert_eq!(&forward.as_bytes()[34..67], push32(&sorted[0]).as_slice());
    }

    #[test]
    fn test_quorum_and_key_set_rejection() {
        let staker = xonly_key(1);
        let fp = xonly_key(2);
        let covenants = vec![xonly_key(10), xonly_key(11), xonly_key(12)];

        assert!(build_unbonding_script(&staker, &covenants, 0).is_err());
        assert!(build_unbonding_script(&staker, &covenants, 4).is_err());
        assert!(build_unbonding_script(&staker, &[], 1).is_err());
        assert!(build_slashing_script(&staker, &[], &covenants, 2).is_err());
        assert!(build_slashing_script(&staker, &[fp], &[], 1).is_err());

        let duplicated = vec![xonly_key(10), xonly_key(10)];
        let err = build_unbonding_script(&staker, &duplicated, 1).unwrap_err();
        assert!(err.to_string().contains("duplicate covenant key"));
    }

    #[test]
    fn test_staking_scripts_reject_shared_roles() {
        let staker = xonly_key(1);
        let fp = xonly_key(2);
        let covenants = vec![xonly_key(10), xonly_key(11)];

        assert!(StakingScripts::new(&staker, &[staker], &covenants, 1, 100).is_err());
        assert!(StakingScripts::new(&staker, &[fp], &[staker, xonly_key(11)], 1, 100).is_err());
        assert!(StakingScripts::new(&staker, &[fp], &[fp, xonly_key(11)], 1, 100).is_err());

        let scripts = StakingScripts::new(&staker, &[fp], &covenants, 2, 100).unwrap();
        assert_eq!(scripts.time_lock, build_timelock_script(&staker, 100).unwrap());
        assert_eq!(scripts.unbonding, build_unbonding_script(&staker, &covenants, 2).unwrap());
        assert_eq!(
            scripts.slashing,
            build_slashing_script(&staker, &[fp], &covenants, 2).unwrap()
        );
    }
}
