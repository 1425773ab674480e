//! # Services Module
//!
//! HTTP clients for the staking network's public APIs.
//!
//! ## Components
//!
//! - **Params Client**: versioned staking parameters (covenant committee, bounds)
//! - **Provider Client**: registered finality providers

pub mod params_client;
pub mod provider_client;

pub use params_client::ParamsClient;
pub use provider_client::ProviderClient;

use crate::error::{StakingError, StakingResult};
use crate::config::network::REQUEST_TIMEOUT;
use reqwest::{Client, Response};
use std::env;

/// Resolve an endpoint URL: explicit value, then environment (including `.env`),
/// then the built-in default.
pub fn resolve_url(explicit: Option<&str>, env_var: &str, default: &str) -> String {
    if let Some(url) = explicit.filter(|url| !url.trim().is_empty()) {
        return url.trim().to_string();
    }

    dotenv::dotenv().ok();
    env::var(env_var)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn http_client() -> StakingResult<Client> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// Map a non-success status to `StakingError::Api`, keeping the body as context.
pub(crate) async fn check_status(response: Response, what: &str) -> StakingResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = body.trim();
    Err(StakingError::Api {
        status: status.as_u16(),
        message: if detail.is_empty() {
            format!("failed to fetch {}", what)
        } else {
            format!("failed to fetch {}: {}", what, detail)
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_url_wins() {
        let url = resolve_url(
            Some(" https://example.org/params "),
            "STAKING_TEST_UNSET_VARIABLE",
            "https://default.invalid",
        );
        assert_eq!(url, "https://example.org/params");
    }

    #[test]
    fn test_default_url_when_unset() {
        let url = resolve_url(None, "STAKING_TEST_UNSET_VARIABLE", "https://default.invalid");
        assert_eq!(url, "https://default.invalid");

        let blank = resolve_url(Some("  "), "STAKING_TEST_UNSET_VARIABLE", "https://default.invalid");
        assert_eq!(blank, "https://default.invalid");
    }
}
