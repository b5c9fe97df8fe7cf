//! Registry of known metadata providers.

use std::sync::Arc;

use super::{Provider, ProviderError};
use crate::config::Preferences;
use crate::utils::HttpTransport;

#[cfg(feature = "source-dblp")]
use super::DblpProvider;

/// Builds a provider instance bound to an optional credential
pub type ProviderFactory = Arc<dyn Fn(Option<String>) -> Arc<dyn Provider> + Send + Sync>;

/// Static description of one provider and where its preferences live
#[derive(Clone)]
pub struct ProviderConfig {
    /// Unique, stable identifier
    pub key: String,

    /// Display name
    pub name: String,

    /// Preference key of the "enabled" flag
    pub enabled_pref_key: String,

    /// Preference key of the credential, if the provider has one
    pub api_key_pref_key: Option<String>,

    /// Whether the provider refuses to run without a credential
    pub requires_api_key: bool,

    factory: ProviderFactory,
}

impl ProviderConfig {
    /// Create a config using the standard `dataprovider.<key>.*` preference keys
    pub fn new<F>(key: impl Into<String>, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Option<String>) -> Arc<dyn Provider> + Send + Sync + 'static,
    {
        let key = key.into();
        Self {
            enabled_pref_key: format!("dataprovider.{}.enable", key),
            api_key_pref_key: Some(format!("dataprovider.{}.apiKey", key)),
            key,
            name: name.into(),
            requires_api_key: false,
            factory: Arc::new(factory),
        }
    }

    pub fn requires_api_key(mut self, requires: bool) -> Self {
        self.requires_api_key = requires;
        self
    }

    /// Whether the provider is currently enabled; a missing flag reads as disabled
    pub fn is_enabled(&self, prefs: &dyn Preferences) -> bool {
        prefs.get_bool(&self.enabled_pref_key).unwrap_or(false)
    }

    /// Configured credential, ignoring blank values
    pub fn api_key(&self, prefs: &dyn Preferences) -> Option<String> {
        self.api_key_pref_key
            .as_deref()
            .and_then(|key| prefs.get_string(key))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Build a provider instance bound to `api_key`
    pub fn create_provider(&self, api_key: Option<String>) -> Arc<dyn Provider> {
        (self.factory)(api_key)
    }

    /// Build a provider using the credential from `prefs`
    pub fn instantiate(&self, prefs: &dyn Preferences) -> Result<Arc<dyn Provider>, ProviderError> {
        let api_key = self.api_key(prefs);
        if self.requires_api_key && api_key.is_none() {
            return Err(ProviderError::MissingApiKey(self.key.clone()));
        }
        Ok(self.create_provider(api_key))
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("enabled_pref_key", &self.enabled_pref_key)
            .field("api_key_pref_key", &self.api_key_pref_key)
            .field("requires_api_key", &self.requires_api_key)
            .finish_non_exhaustive()
    }
}

/// Registry for all available metadata providers
///
/// Built once at start-up and shared read-only. Registration order is query
/// order, and therefore the order results appear in.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    configs: Vec<ProviderConfig>,
}

impl ProviderRegistry {
    /// Create a registry with every compiled-in provider
    pub fn new(client: Arc<dyn HttpTransport>) -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();

        #[cfg(feature = "source-dblp")]
        {
            let client = Arc::clone(&client);
            registry.register(ProviderConfig::new("dblp", "DBLP", move |api_key| {
                Arc::new(DblpProvider::new(Arc::clone(&client), api_key)) as Arc<dyn Provider>
            }));
        }

        let _ = client;
        registry
    }

    /// Create a registry with no providers
    pub fn empty() -> Self {
        Self {
            configs: Vec::new(),
        }
    }

    /// Register a provider config; a config with an existing key replaces it in place
    pub fn register(&mut self, config: ProviderConfig) {
        match self.configs.iter_mut().find(|c| c.key == config.key) {
            Some(existing) => *existing = config,
            None => self.configs.push(config),
        }
    }

    /// Every registered config, in registration order
    pub fn all_configs(&self) -> Vec<ProviderConfig> {
        self.configs.clone()
    }

    /// Configs whose enabled flag is currently set, in registration order
    pub fn enabled_configs(&self, prefs: &dyn Preferences) -> Vec<ProviderConfig> {
        self.configs
            .iter()
            .filter(|c| c.is_enabled(prefs))
            .cloned()
            .collect()
    }

    /// Get a config by key
    pub fn get(&self, key: &str) -> Option<&ProviderConfig> {
        self.configs.iter().find(|c| c.key == key)
    }

    /// Get all provider keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.configs.iter().map(|c| c.key.as_str())
    }

    /// Get the number of registered providers
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;
    use crate::utils::HttpClient;
    use std::collections::HashMap;

    fn mock_config(key: &str) -> ProviderConfig {
        let owned = key.to_string();
        ProviderConfig::new(key, key.to_uppercase(), move |api_key| {
            Arc::new(MockProvider::new(owned.clone(), owned.to_uppercase()).with_api_key(api_key))
                as Arc<dyn Provider>
        })
    }

    fn prefs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    #[cfg(feature = "source-dblp")]
    fn test_registry_default_providers() {
        let registry = ProviderRegistry::new(Arc::new(HttpClient::new().unwrap()));

        assert_eq!(registry.len(), 1);
        let dblp = registry.get("dblp").unwrap();
        assert_eq!(dblp.name, "DBLP");
        assert_eq!(dblp.enabled_pref_key, "dataprovider.dblp.enable");
        assert_eq!(dblp.api_key_pref_key.as_deref(), Some("dataprovider.dblp.apiKey"));
        assert!(!dblp.requires_api_key);

        let provider = dblp.create_provider(Some("k".to_string()));
        assert_eq!(provider.key(), "dblp");
        assert_eq!(provider.api_key(), Some("k"));
    }

    #[test]
    fn test_enabled_configs_preserve_order() {
        let mut registry = ProviderRegistry::empty();
        registry.register(mock_config("a"));
        registry.register(mock_config("b"));
        registry.register(mock_config("c"));

        let prefs = prefs(&[
            ("dataprovider.a.enable", "true"),
            ("dataprovider.b.enable", "false"),
            ("dataprovider.c.enable", "true"),
        ]);

        let keys: Vec<String> = registry
            .enabled_configs(&prefs)
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec!["a", "c"]);
        assert_eq!(registry.all_configs().len(), 3);
    }

    #[test]
    fn test_all_configs_is_a_copy() {
        let mut registry = ProviderRegistry::empty();
        registry.register(mock_config("a"));

        let mut copy = registry.all_configs();
        copy[0].name = "changed".to_string();
        copy.clear();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().name, "A");
    }

    #[test]
    fn test_register_replaces_same_key() {
        let mut registry = ProviderRegistry::empty();
        registry.register(mock_config("a"));
        registry.register(mock_config("b"));
        registry.register(mock_config("a").requires_api_key(true));

        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(registry.get("a").unwrap().requires_api_key);
    }

    #[test]
    fn test_instantiate_requires_api_key() {
        let config = mock_config("a").requires_api_key(true);

        let missing = prefs(&[("dataprovider.a.apiKey", "   ")]);
        let err = config.instantiate(&missing).unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey(ref k) if k == "a"));

        let present = prefs(&[("dataprovider.a.apiKey", " secret ")]);
        let provider = config.instantiate(&present).unwrap();
        assert_eq!(provider.api_key(), Some("secret"));
    }

    #[test]
    fn test_missing_enable_flag_reads_as_disabled() {
        let config = mock_config("a");
        assert!(!config.is_enabled(&prefs(&[])));
    }
}
