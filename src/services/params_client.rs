use super::{check_status, http_client, resolve_url};
use crate::config::{env as config_env, network};
use crate::error::StakingResult;
use crate::params::{NetworkInfo, VersionedParams};
use reqwest::Client;

/// Client for the staking API's `network-info` endpoint
#[derive(Debug, Clone)]
pub struct ParamsClient {
    client: Client,
    url: String,
}

impl ParamsClient {
    /// Create a client for the URL configured in the environment, or the default
    pub fn new() -> StakingResult<Self> {
        Self::with_url(None)
    }

    /// Create a client for an explicit URL, falling back to the environment
    pub fn with_url(url: Option<&str>) -> StakingResult<Self> {
        Ok(Self {
            client: http_client()?,
            url: resolve_url(
                url,
                config_env::PARAMS_API_URL,
                network::DEFAULT_PARAMS_API_URL,
            ),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch every published parameter version
    pub async fn fetch_network_info(&self) -> StakingResult<NetworkInfo> {
        log::debug!("fetching staking parameters from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let response = check_status(response, "staking parameters").await?;
        let body = response.text().await?;
        let info: NetworkInfo = serde_json::from_str(&body)?;

        log::debug!("received {} parameter versions", info.data.params.bbn.len());
        Ok(info)
    }

    /// Fetch and return the highest parameter version
    pub async fn fetch_latest_params(&self) -> StakingResult<VersionedParams> {
        let info = self.fetch_network_info().await?;
        info.latest_params().cloned()
    }
}
