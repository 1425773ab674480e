//! # Staking Parameters
//!
//! Versioned network parameters as served by the staking API's `network-info`
//! endpoint. Only the latest version is used to build new outputs.

use crate::error::{StakingError, StakingResult};
use crate::keys::parse_public_keys;
use bitcoin::{secp256k1::XOnlyPublicKey, Amount};
use serde::{Deserialize, Serialize};

/// One version of the covenant committee and staking bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedParams {
    pub version: u32,
    pub covenant_pks: Vec<String>,
    pub covenant_quorum: u32,
    pub min_staking_value_sat: u64,
    pub max_staking_value_sat: u64,
    pub min_staking_time_blocks: u32,
    pub max_staking_time_blocks: u32,
    pub unbonding_time_blocks: u32,
    /// Fee deducted from the staked value when the unbonding output is created
    #[serde(default)]
    pub unbonding_fee_sat: u64,
}

impl VersionedParams {
    /// Use the requested staking time, or the network minimum when none was given.
    pub fn resolve_staking_time(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(blocks) if blocks > 0 => blocks,
            _ => {
                log::info!(
                    "using network minimum staking time of {} blocks",
                    self.min_staking_time_blocks
                );
                self.min_staking_time_blocks
            }
        }
    }

    /// Check a stake against the value and time bounds of this version.
    pub fn validate_stake(&self, amount: Amount, staking_time_blocks: u32) -> StakingResult<()> {
        let sats = amount.to_sat();
        if sats < self.min_staking_value_sat || sats > self.max_staking_value_sat {
            return Err(StakingError::StakeOutOfBounds {
                field: "amount",
                value: sats,
                min: self.min_staking_value_sat,
                max: self.max_staking_value_sat,
            });
        }
        if staking_time_blocks < self.min_staking_time_blocks
            || staking_time_blocks > self.max_staking_time_blocks
        {
            return Err(StakingError::StakeOutOfBounds {
                field: "time",
                value: u64::from(staking_time_blocks),
                min: u64::from(self.min_staking_time_blocks),
                max: u64::from(self.max_staking_time_blocks),
            });
        }
        Ok(())
    }

    /// Parse the covenant committee keys.
    pub fn covenant_keys(&self) -> StakingResult<Vec<XOnlyPublicKey>> {
        if self.covenant_pks.is_empty() {
            return Err(StakingError::param(
                "no covenant public keys found in staking parameters",
            ));
        }
        parse_public_keys(&self.covenant_pks)
    }

    /// Value of the unbonding output for a given stake.
    pub fn unbonding_amount(&self, staking_amount: Amount) -> StakingResult<Amount> {
        staking_amount
            .checked_sub(Amount::from_sat(self.unbonding_fee_sat))
            .filter(|amount| *amount > Amount::ZERO)
            .ok_or_else(|| {
                StakingError::param(format!(
                    "staking amount {} does not cover the unbonding fee of {} sat",
                    staking_amount.to_sat(),
                    self.unbonding_fee_sat
                ))
            })
    }
}

/// Response body of the `network-info` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub data: NetworkInfoData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInfoData {
    pub params: ParamsSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsSet {
    #[serde(default)]
    pub bbn: Vec<VersionedParams>,
}

impl NetworkInfo {
    /// The parameter version with the highest version number. On a tie the
    /// entry listed first wins.
    pub fn latest(&self) -> Option<&VersionedParams> {
        self.data
            .params
            .bbn
            .iter()
            .reduce(|best, params| if params.version > best.version { params } else { best })
    }

    pub fn latest_params(&self) -> StakingResult<&VersionedParams> {
        self.latest().ok_or(StakingError::MissingParams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETWORK_INFO: &str = r#"{
        "data": {
            "staking_status": { "is_staking_open": true },
            "params": {
                "bbn": [
                    {
                        "version": 0,
                        "covenant_pks": ["d45c70d28f169e1f0c7f4a78e2bc73497afe585b70aa897955989068f3350aaa"],
                        "covenant_quorum": 1,
                        "min_staking_value_sat": 50000,
                        "max_staking_value_sat": 5000000,
                        "min_staking_time_blocks": 64000,
                        "max_staking_time_blocks": 64000,
                        "unbonding_time_blocks": 1008,
                        "unbonding_fee_sat": 1000
                    },
                    {
                        "version": 2,
                        "covenant_pks": [
                            "d45c70d28f169e1f0c7f4a78e2bc73497afe585b70aa897955989068f3350aaa",
                            "4b15848e495a3a62283daaadb3f458a00859fe48e321f0121ebabbdd6698f9fa"
                        ],
                        "covenant_quorum": 2,
                        "min_staking_value_sat": 500000,
                        "max_staking_value_sat": 50000000000,
                        "min_staking_time_blocks": 10000,
                        "max_staking_time_blocks": 64000,
                        "unbonding_time_blocks": 301,
                        "delegation_creation_base_gas_fee": 1095000
                    },
                    {
                        "version": 1,
                        "covenant_pks": [],
                        "covenant_quorum": 1,
                        "min_staking_value_sat": 1,
                        "max_staking_value_sat": 2,
                        "min_staking_time_blocks": 1,
                        "max_staking_time_blocks": 2,
                        "unbonding_time_blocks": 1
                    }
                ]
            }
        }
    }"#;

    fn latest() -> VersionedParams {
        let info: NetworkInfo = serde_json::from_str(NETWORK_INFO).unwrap();
        info.latest_params().unwrap().clone()
    }

    #[test]
    fn test_latest_version_is_selected() {
        let params = latest();
        assert_eq!(params.version, 2);
        assert_eq!(params.covenant_quorum, 2);
        assert_eq!(params.unbonding_fee_sat, 0);
        assert_eq!(params.covenant_keys().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_versions() {
        let info: NetworkInfo = serde_json::from_str(r#"{"data":{"params":{}}}"#).unwrap();
        assert!(info.latest().is_none());
        assert!(matches!(info.latest_params(), Err(StakingError::MissingParams)));
    }

    #[test]
    fn test_duplicate_versions_keep_first_entry() {
        let mut info: NetworkInfo = serde_json::from_str(NETWORK_INFO).unwrap();
        let mut duplicate = info.latest_params().unwrap().clone();
        duplicate.covenant_quorum = 1;
        info.data.params.bbn.push(duplicate);

        assert_eq!(info.latest().unwrap().covenant_quorum, 2);
    }

    #[test]
    fn test_staking_time_resolution() {
        let params = latest();
        assert_eq!(params.resolve_staking_time(None), 10_000);
        assert_eq!(params.resolve_staking_time(Some(0)), 10_000);
        assert_eq!(params.resolve_staking_time(Some(20_000)), 20_000);
    }

    #[test]
    fn test_stake_bounds() {
        let params = latest();
        assert!(params.validate_stake(Amount::from_sat(1_000_000), 64_000).is_ok());

        let low = params.validate_stake(Amount::from_sat(499_999), 64_000).unwrap_err();
        assert!(matches!(low, StakingError::StakeOutOfBounds { field: "amount", .. }));

        let long = params.validate_stake(Amount::from_sat(1_000_000), 64_001).unwrap_err();
        assert!(matches!(long, StakingError::StakeOutOfBounds { field: "time", .. }));

        let short = params.validate_stake(Amount::from_sat(1_000_000), 9_999).unwrap_err();
        assert!(short.is_input_error());
    }

    #[test]
    fn test_empty_covenant_set_is_rejected() {
        let mut params = latest();
        params.covenant_pks.clear();
        assert!(matches!(
            params.covenant_keys(),
            Err(StakingError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_unbonding_amount() {
        let mut params = latest();
        assert_eq!(
            params.unbonding_amount(Amount::from_sat(1_000_000)).unwrap(),
            Amount::from_sat(1_000_000)
        );

        params.unbonding_fee_sat = 1_000;
        assert_eq!(
            params.unbonding_amount(Amount::from_sat(1_000_000)).unwrap(),
            Amount::from_sat(999_000)
        );
        assert!(params.unbonding_amount(Amount::from_sat(1_000)).is_err());
        assert!(params.unbonding_amount(Amount::from_sat(999)).is_err());
    }
}
