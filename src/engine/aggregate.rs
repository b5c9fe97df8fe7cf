//! Provider fan-out.

use futures_util::future::join_all;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;

use crate::config::Preferences;
use crate::models::SearchResult;
use crate::providers::{ProviderConfig, ProviderRegistry};

/// Query every given provider for `title` and concatenate their results in
/// config order.
///
/// Lookups run concurrently and each one settles on its own: a provider that
/// fails, panics, or lacks a required credential contributes nothing and
/// leaves the others untouched. Nothing is retried, deduplicated or ranked.
pub async fn aggregate(
    title: &str,
    configs: &[ProviderConfig],
    prefs: &dyn Preferences,
) -> Vec<SearchResult> {
    if configs.is_empty() {
        return Vec::new();
    }

    let lookups = configs.iter().map(|config| async move {
        let provider = match config.instantiate(prefs) {
            Ok(provider) => provider,
            Err(e) => {
                tracing::warn!("Skipping provider {}: {}", config.key, e);
                return Vec::new();
            }
        };

        match AssertUnwindSafe(provider.fetch_by_title(title))
            .catch_unwind()
            .await
        {
            Ok(items) => {
                tracing::debug!("{} contributed {} results", config.key, items.len());
                items
                    .into_iter()
                    .map(|metadata| SearchResult::new(&config.key, &config.name, metadata))
                    .collect()
            }
            Err(_) => {
                tracing::warn!("Provider {} panicked during lookup", config.key);
                Vec::new()
            }
        }
    });

    join_all(lookups).await.into_iter().flatten().collect()
}

/// Query every currently enabled provider in `registry`
pub async fn search_enabled(
    title: &str,
    registry: &ProviderRegistry,
    prefs: &dyn Preferences,
) -> Vec<SearchResult> {
    let configs = registry.enabled_configs(prefs);
    aggregate(title, &configs, prefs).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::make_metadata;
    use crate::providers::{MockProvider, Provider};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn config_for(provider: Arc<MockProvider>) -> ProviderConfig {
        let key = provider.key().to_string();
        let name = provider.name().to_string();
        ProviderConfig::new(key, name, move |_| Arc::clone(&provider) as Arc<dyn Provider>)
    }

    fn no_prefs() -> HashMap<String, String> {
        HashMap::new()
    }

    #[tokio::test]
    async fn test_concatenates_in_config_order() {
        let a = Arc::new(
            MockProvider::new("a", "A")
                .with_results(vec![make_metadata("a1"), make_metadata("a2")]),
        );
        let b = Arc::new(MockProvider::new("b", "B").with_results(vec![make_metadata("b1")]));
        let configs = vec![config_for(a.clone()), config_for(b.clone())];

        let results = aggregate("query", &configs, &no_prefs()).await;

        let tagged: Vec<(&str, &str)> = results
            .iter()
            .map(|r| (r.provider_key.as_str(), r.metadata.title.as_str()))
            .collect();
        assert_eq!(tagged, vec![("a", "a1"), ("a", "a2"), ("b", "b1")]);
        assert_eq!(results[2].provider_name, "B");
        assert_eq!(a.queried_titles(), vec!["query"]);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let failing = Arc::new(MockProvider::new("failing", "Failing").failing());
        let panicking = Arc::new(MockProvider::new("panicking", "Panicking").panicking());
        let healthy = Arc::new(
            MockProvider::new("healthy", "Healthy")
                .with_results(vec![make_metadata("h1"), make_metadata("h2")]),
        );
        let configs = vec![
            config_for(failing.clone()),
            config_for(panicking.clone()),
            config_for(healthy.clone()),
        ];

        let results = aggregate("query", &configs, &no_prefs()).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.provider_key == "healthy"));
        assert_eq!(failing.calls(), 1);
        assert_eq!(panicking.calls(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let a = Arc::new(MockProvider::new("a", "A").with_results(vec![make_metadata("Same")]));
        let b = Arc::new(MockProvider::new("b", "B").with_results(vec![make_metadata("Same")]));
        let configs = vec![config_for(a), config_for(b)];

        let results = aggregate("Same", &configs, &no_prefs()).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].metadata, results[1].metadata);
    }

    #[tokio::test]
    async fn test_no_configs_queries_nothing() {
        let results = aggregate("anything", &[], &no_prefs()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_missing_required_key_skips_provider() {
        let locked = Arc::new(MockProvider::new("locked", "Locked").with_results(vec![make_metadata("x")]));
        let configs = vec![config_for(locked.clone()).requires_api_key(true)];

        let results = aggregate("x", &configs, &no_prefs()).await;
        assert!(results.is_empty());
        assert_eq!(locked.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_enabled_filters_registry() {
        let on = Arc::new(MockProvider::new("on", "On").with_results(vec![make_metadata("x")]));
        let off = Arc::new(MockProvider::new("off", "Off").with_results(vec![make_metadata("y")]));

        let mut registry = ProviderRegistry::empty();
        registry.register(config_for(on.clone()));
        registry.register(config_for(off.clone()));

        let mut prefs = HashMap::new();
        prefs.insert("dataprovider.on.enable".to_string(), "true".to_string());

        let results = search_enabled("x", &registry, &prefs).await;
        assert_eq!(results.len(), 1);
        assert_eq!(off.calls(), 0);
    }
}
