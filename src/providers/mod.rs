//! Metadata provider plugins with a trait-based contract.
//!
//! Every external metadata source implements [`Provider`]. Adapters only
//! implement the fallible [`Provider::search_title`]; callers go through
//! [`Provider::fetch_by_title`], which never fails: transport errors, empty
//! responses and malformed payloads all come back as an empty list and are
//! only visible in the logs.
//!
//! # Feature Flags
//!
//! Individual providers can be disabled at compile time using Cargo features:
//!
//! - `dblp` - Enable the DBLP provider (default: enabled)
//!
//! # Runtime Provider Configuration
//!
//! Compiled-in providers are enabled per key through the preference source
//! (see [`crate::config::Preferences`]):
//!
//! ```toml
//! [dataprovider.dblp]
//! enable = true
//! api_key = ""
//! ```
//!
//! or with environment variables such as `KENTRIDGE_DATAPROVIDER__DBLP__ENABLE=false`.

#[cfg(feature = "source-dblp")]
mod dblp;
mod registry;

pub mod mock;

#[cfg(feature = "source-dblp")]
pub use dblp::DblpProvider;
pub use mock::MockProvider;
pub use registry::{ProviderConfig, ProviderFactory, ProviderRegistry};

use crate::models::CanonicalMetadata;
use async_trait::async_trait;

/// The Provider trait defines the interface for all metadata sources.
///
/// # Implementing a New Provider
///
/// 1. Create a new struct that implements `Provider`
/// 2. Implement `key`, `name` and `search_title`
/// 3. Add a [`ProviderConfig`] for it in `ProviderRegistry::new()`
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Unique, stable identifier (e.g. "dblp")
    fn key(&self) -> &str;

    /// Human-readable name of this provider
    fn name(&self) -> &str;

    /// Credential this instance was created with, if any
    fn api_key(&self) -> Option<&str> {
        None
    }

    /// Look up records whose title matches `title`
    async fn search_title(&self, title: &str) -> Result<Vec<CanonicalMetadata>, ProviderError>;

    /// Fetch metadata by title, degrading every failure to "no results"
    async fn fetch_by_title(&self, title: &str) -> Vec<CanonicalMetadata> {
        match self.search_title(title).await {
            Ok(results) => {
                tracing::debug!("{} returned {} results", self.key(), results.len());
                results
            }
            Err(e) => {
                tracing::debug!("{} lookup failed: {}", self.key(), e);
                Vec::new()
            }
        }
    }
}

/// Errors that can occur when interacting with a provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Non-200 response from the provider
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Parsing error (JSON, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider needs a credential that is not configured
    #[error("Missing API key for provider '{0}'")]
    MissingApiKey(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemType;

    #[derive(Debug)]
    struct BrokenProvider;

    #[async_trait]
    impl Provider for BrokenProvider {
        fn key(&self) -> &str {
            "broken"
        }

        fn name(&self) -> &str {
            "Broken"
        }

        async fn search_title(&self, _title: &str) -> Result<Vec<CanonicalMetadata>, ProviderError> {
            Err(ProviderError::Status(503))
        }
    }

    #[test]
    fn test_fetch_by_title_swallows_errors() {
        let results = tokio_test::block_on(BrokenProvider.fetch_by_title("anything"));
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_by_title_passes_results_through() {
        let provider = MockProvider::new("m", "M")
            .with_results(vec![CanonicalMetadata::new(ItemType::Book, "A Book")]);
        let results = provider.fetch_by_title("A Book").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "A Book");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ProviderError::MissingApiKey("crossref".to_string()).to_string(),
            "Missing API key for provider 'crossref'"
        );
        assert_eq!(ProviderError::Status(500).to_string(), "Unexpected HTTP status: 500");
    }
}
