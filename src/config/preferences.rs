//! Key-value preference surface read by the provider registry and the
//! reconciliation engine.
//!
//! Keys follow the host's preference naming:
//!
//! - `dataprovider.<key>.enable` (bool)
//! - `dataprovider.<key>.apiKey` (string)
//! - `updateStrategy` (string, `replace` or `supplement`)

use std::collections::HashMap;

use super::Config;

/// Preference key holding the merge strategy
pub const UPDATE_STRATEGY_PREF: &str = "updateStrategy";

const PROVIDER_PREFIX: &str = "dataprovider.";

/// Read-only access to externally managed preferences
pub trait Preferences: Send + Sync {
    fn get_bool(&self, key: &str) -> Option<bool>;

    fn get_string(&self, key: &str) -> Option<String>;
}

impl Preferences for Config {
    fn get_bool(&self, key: &str) -> Option<bool> {
        match split_provider_key(key)? {
            (provider, "enable") => self.provider(provider).map(|p| p.enable),
            _ => None,
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        if key == UPDATE_STRATEGY_PREF {
            return Some(self.update_strategy.as_str().to_string());
        }

        match split_provider_key(key)? {
            (provider, "apiKey") => self.provider(provider).and_then(|p| p.api_key.clone()),
            _ => None,
        }
    }
}

/// Plain string map, for embedders and tests
impl Preferences for HashMap<String, String> {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// "dataprovider.dblp.enable" -> ("dblp", "enable")
fn split_provider_key(key: &str) -> Option<(&str, &str)> {
    key.strip_prefix(PROVIDER_PREFIX)?.rsplit_once('.')
}
