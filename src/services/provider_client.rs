use super::{check_status, http_client, resolve_url};
use crate::config::{env as config_env, network};
use crate::error::StakingResult;
use crate::providers::{FinalityProvider, ProvidersResponse};
use reqwest::Client;

/// Client for the finality provider registry
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Client,
    url: String,
}

impl ProviderClient {
    pub fn new() -> StakingResult<Self> {
        Self::with_url(None)
    }

    pub fn with_url(url: Option<&str>) -> StakingResult<Self> {
        Ok(Self {
            client: http_client()?,
            url: resolve_url(
                url,
                config_env::PROVIDERS_API_URL,
                network::DEFAULT_PROVIDERS_API_URL,
            ),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the full provider list, in registry order
    pub async fn fetch_providers(&self) -> StakingResult<Vec<FinalityProvider>> {
        log::debug!("fetching finality providers from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let response = check_status(response, "finality providers").await?;
        let body = response.text().await?;
        let parsed: ProvidersResponse = serde_json::from_str(&body)?;

        log::debug!("received {} finality providers", parsed.finality_providers.len());
        Ok(parsed.finality_providers)
    }
}
