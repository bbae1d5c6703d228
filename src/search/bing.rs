//! Bing Web Search v7 provider.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::BingConfig;
use crate::providers::sanitize_http_error_body;

use super::{SearchError, SearchProvider};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Top-level Bing search response.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BingResponse {
    /// Web results; absent when Bing found nothing.
    #[serde(default)]
    pub web_pages: Option<BingWebPages>,
}

/// Web result container.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct BingWebPages {
    /// Ranked results.
    #[serde(default)]
    pub value: Vec<BingWebPage>,
}

/// A single web result.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct BingWebPage {
    /// Result URL.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Bing Web Search client.
#[derive(Clone)]
pub struct BingSearch {
    endpoint: Url,
    api_key: String,
    count: u32,
    market: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for BingSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BingSearch")
            .field("endpoint", &self.endpoint.as_str())
            .field("count", &self.count)
            .field("market", &self.market)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl BingSearch {
    /// Create a client from config and an explicit subscription key.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Unavailable` if the endpoint is not a valid URL,
    /// or `SearchError::Request` if the HTTP client cannot be built.
    pub fn new(config: &BingConfig, api_key: impl Into<String>) -> Result<Self, SearchError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            SearchError::Unavailable(format!("invalid endpoint '{}': {e}", config.endpoint))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            endpoint,
            api_key: api_key.into(),
            count: config.count,
            market: config.market.clone(),
            client,
        })
    }

    /// Create a client reading the key from the configured env var.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Unavailable` when the key variable is unset or empty.
    pub fn from_config(config: &BingConfig) -> Result<Self, SearchError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                SearchError::Unavailable(format!(
                    "missing subscription key in environment variable {}",
                    config.api_key_env
                ))
            })?;
        Self::new(config, api_key)
    }

    /// Request URL for a query.
    pub fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("count", &self.count.to_string());
            if let Some(market) = &self.market {
                pairs.append_pair("mkt", market);
            }
        }
        url
    }
}

/// Extract result URLs from a Bing response body, preserving rank order.
///
/// # Errors
///
/// Returns `SearchError::Parse` if the body is not a Bing search response.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<Vec<String>, SearchError> {
    let resp: BingResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;
    Ok(resp
        .web_pages
        .map(|pages| pages.value.into_iter().map(|page| page.url).collect())
        .unwrap_or_default())
}

#[async_trait::async_trait]
impl SearchProvider for BingSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let url = self.request_url(query);
        debug!(query, count = self.count, "bing search");

        let response = self
            .client
            .get(url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SearchError::HttpStatus {
                status: status.as_u16(),
                body: sanitize_http_error_body(&body),
            });
        }

        let urls = parse_response(&body)?;
        debug!(results = urls.len(), "bing search complete");
        Ok(urls)
    }
}
