//! # Finality Providers
//!
//! Registry entries returned by the `btcstaking/v1/finality_providers` endpoint,
//! used to pick the finality provider key for a stake.

use crate::error::StakingResult;
use crate::keys::parse_public_key;
use bitcoin::secp256k1::XOnlyPublicKey;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Public description a provider registers with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderDescription {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub security_contact: String,
    pub details: String,
}

/// One registered finality provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityProvider {
    #[serde(default)]
    pub description: ProviderDescription,
    /// Decimal fraction, e.g. `"0.050000000000000000"`
    #[serde(default)]
    pub commission: Option<String>,
    #[serde(default)]
    pub addr: String,
    pub btc_pk: String,
    #[serde(default, deserialize_with = "height_from_any")]
    pub slashed_babylon_height: u64,
    #[serde(default, deserialize_with = "height_from_any")]
    pub slashed_btc_height: u64,
    #[serde(default)]
    pub jailed: bool,
    #[serde(default)]
    pub soft_deleted: bool,
}

/// Response body of the providers endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersResponse {
    #[serde(default)]
    pub finality_providers: Vec<FinalityProvider>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Active,
    Jailed,
    Slashed,
    Inactive,
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderStatus::Active => "active",
            ProviderStatus::Jailed => "jailed",
            ProviderStatus::Slashed => "slashed",
            ProviderStatus::Inactive => "inactive",
        };
        f.write_str(label)
    }
}

impl FinalityProvider {
    /// Slashing takes precedence over jailing, which takes precedence over removal.
    pub fn status(&self) -> ProviderStatus {
        if self.slashed_babylon_height > 0 || self.slashed_btc_height > 0 {
            ProviderStatus::Slashed
        } else if self.jailed {
            ProviderStatus::Jailed
        } else if self.soft_deleted {
            ProviderStatus::Inactive
        } else {
            ProviderStatus::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == ProviderStatus::Active
    }

    /// Commission as a percentage, if the API reported a parseable value
    pub fn commission_percent(&self) -> Option<f64> {
        self.commission
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .map(|fraction| fraction * 100.0)
    }

    pub fn btc_key(&self) -> StakingResult<XOnlyPublicKey> {
        parse_public_key(&self.btc_pk)
    }

    /// Case-insensitive moniker search
    pub fn matches(&self, term: &str) -> bool {
        self.description
            .moniker
            .to_lowercase()
            .contains(&term.to_lowercase())
    }
}

/// Heights come back as JSON strings from some endpoints and numbers from others.
fn height_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Height {
        Number(u64),
        Text(String),
    }

    match Height::deserialize(deserializer)? {
        Height::Number(height) => Ok(height),
        Height::Text(text) if text.trim().is_empty() => Ok(0),
        Height::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROVIDERS: &str = r#"{
        "finality_providers": [
            {
                "description": {
                    "moniker": "Nodes.Guru",
                    "identity": "",
                    "website": "https://nodes.guru",
                    "security_contact": "security@nodes.guru",
                    "details": ""
                },
                "commission": "0.050000000000000000",
                "addr": "bbn1qqq",
                "btc_pk": "d45c70d28f169e1f0c7f4a78e2bc73497afe585b70aa897955989068f3350aaa",
                "slashed_babylon_height": "0",
                "slashed_btc_height": 0,
                "jailed": false,
                "soft_deleted": false
            },
            {
                "description": { "moniker": "Slashed One" },
                "commission": "0.1",
                "btc_pk": "4b15848e495a3a62283daaadb3f458a00859fe48e321f0121ebabbdd6698f9fa",
                "slashed_babylon_height": "1200",
                "slashed_btc_height": 0,
                "jailed": true
            },
            {
                "description": { "moniker": "Jailed Validator" },
                "btc_pk": "4b15848e495a3a62283daaadb3f458a00859fe48e321f0121ebabbdd6698f9fa",
                "jailed": true,
                "soft_deleted": true
            },
            {
                "description": { "moniker": "Gone" },
                "commission": "n/a",
                "btc_pk": "zz",
                "soft_deleted": true
            }
        ]
    }"#;

    fn providers() -> Vec<FinalityProvider> {
        serde_json::from_str::<ProvidersResponse>(PROVIDERS)
            .unwrap()
            .finality_providers
    }

    #[test]
    fn test_status_precedence() {
        let statuses: Vec<_> = providers().iter().map(FinalityProvider::status).collect();
        assert_eq!(
            statuses,
            vec![
                ProviderStatus::Active,
                ProviderStatus::Slashed,
                ProviderStatus::Jailed,
                ProviderStatus::Inactive,
            ]
        );
        assert_eq!(ProviderStatus::Inactive.to_string(), "inactive");
    }

    #[test]
    fn test_heights_accept_strings_and_numbers() {
        let list = providers();
        assert_eq!(list[0].slashed_babylon_height, 0);
        assert_eq!(list[1].slashed_babylon_height, 1200);
        assert_eq!(list[2].slashed_btc_height, 0);
    }

    #[test]
    fn test_commission_percent() {
        let list = providers();
        assert!((list[0].commission_percent().unwrap() - 5.0).abs() < 1e-9);
        assert!((list[1].commission_percent().unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(list[2].commission_percent(), None);
        assert_eq!(list[3].commission_percent(), None);
    }

    #[test]
    fn test_btc_key_and_search() {
        let list = providers();
        assert!(list[0].btc_key().is_ok());
        assert!(list[3].btc_key().is_err());

        assert!(list[0].matches("guru"));
        assert!(list[2].matches("JAILED"));
        assert!(!list[1].matches("guru"));
    }
}
