//! Aggregated search results.

use serde::{Deserialize, Serialize};

use super::CanonicalMetadata;

/// One provider result tagged with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Key of the provider that produced this result (e.g. "dblp")
    pub provider_key: String,

    /// Display name of the provider
    pub provider_name: String,

    pub metadata: CanonicalMetadata,
}

impl SearchResult {
    pub fn new(
        provider_key: impl Into<String>,
        provider_name: impl Into<String>,
        metadata: CanonicalMetadata,
    ) -> Self {
        Self {
            provider_key: provider_key.into(),
            provider_name: provider_name.into(),
            metadata,
        }
    }
}
