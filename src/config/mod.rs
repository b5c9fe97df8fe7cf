//! Configuration management.
//!
//! # Configuration File Format
//!
//! ```toml
//! update_strategy = "supplement"   # or "replace"
//!
//! [dataprovider.dblp]
//! enable = true
//! api_key = ""
//!
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! user_agent = "kentridge/0.1.0"
//! ```
//!
//! Every value can be overridden from the environment with the `KENTRIDGE_`
//! prefix and `__` as the section separator, e.g.
//! `KENTRIDGE_UPDATE_STRATEGY=replace` or `KENTRIDGE_DATAPROVIDER__DBLP__ENABLE=false`.

mod preferences;

pub use config::ConfigError;
pub use preferences::{Preferences, UPDATE_STRATEGY_PREF};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::engine::UpdateStrategy;

const CONFIG_FILE_NAME: &str = "kentridge.toml";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// How chosen metadata is merged into an existing record
    #[serde(default)]
    pub update_strategy: UpdateStrategy,

    /// Per-provider enablement and credentials, keyed by provider key
    #[serde(default = "default_providers")]
    pub dataprovider: BTreeMap<String, ProviderSettings>,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_strategy: UpdateStrategy::default(),
            dataprovider: default_providers(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Settings for one provider, if it appears in the configuration
    pub fn provider(&self, key: &str) -> Option<&ProviderSettings> {
        self.dataprovider.get(key)
    }

    /// Enable or disable a provider
    pub fn set_provider_enabled(&mut self, key: &str, enable: bool) {
        self.dataprovider.entry(key.to_string()).or_default().enable = enable;
    }

    /// Set or clear a provider credential
    pub fn set_provider_api_key(&mut self, key: &str, api_key: Option<String>) {
        self.dataprovider.entry(key.to_string()).or_default().api_key = api_key;
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Enablement and credential for one provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub enable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_providers() -> BTreeMap<String, ProviderSettings> {
    let mut providers = BTreeMap::new();
    providers.insert(
        "dblp".to_string(),
        ProviderSettings {
            enable: true,
            api_key: None,
        },
    );
    providers
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("KENTRIDGE")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    settings.try_deserialize()
}

/// Get the configuration from environment variables and defaults only
pub fn get_config() -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(environment())
        .build()?;

    settings.try_deserialize()
}

/// Look for a configuration file in the working directory, then in the
/// platform configuration directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("kentridge").join("config.toml"))
        .filter(|path| path.is_file())
}
