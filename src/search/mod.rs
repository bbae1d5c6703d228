//! Web search abstraction.
//!
//! A [`SearchProvider`] maps one query string to an ordered list of result
//! URLs. [`bing::BingSearch`] is the production implementation.

use async_trait::async_trait;

pub mod bing;

/// Errors returned by search providers.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// HTTP transport failure.
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Upstream search API responded with an error status.
    #[error("search returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// Response did not match expected schema.
    #[error("search response parse error: {0}")]
    Parse(String),
    /// Provider cannot run with current configuration.
    #[error("search provider unavailable: {0}")]
    Unavailable(String),
}

/// Web search interface.
///
/// Implementations must be `Send + Sync`; one provider serves concurrent
/// research steps.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run `query` and return result URLs in rank order. An empty list is a
    /// valid answer.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on API, network, or parse failure.
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError>;
}
