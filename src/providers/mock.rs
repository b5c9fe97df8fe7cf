//! Mock provider for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{CanonicalMetadata, ItemType};
use crate::providers::{Provider, ProviderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Respond,
    Fail,
    Panic,
}

/// A mock provider that returns predefined results and records its calls.
#[derive(Debug)]
pub struct MockProvider {
    key: String,
    name: String,
    api_key: Option<String>,
    results: Mutex<Vec<CanonicalMetadata>>,
    behavior: Behavior,
    calls: AtomicUsize,
    queried: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Create a new mock provider with no results.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            api_key: None,
            results: Mutex::new(Vec::new()),
            behavior: Behavior::Respond,
            calls: AtomicUsize::new(0),
            queried: Mutex::new(Vec::new()),
        }
    }

    /// Return these results for every query.
    pub fn with_results(self, results: Vec<CanonicalMetadata>) -> Self {
        *self.results.lock().unwrap() = results;
        self
    }

    /// Attach the credential this instance was created with.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Fail every lookup with a network error.
    pub fn failing(mut self) -> Self {
        self.behavior = Behavior::Fail;
        self
    }

    /// Panic inside every lookup.
    pub fn panicking(mut self) -> Self {
        self.behavior = Behavior::Panic;
        self
    }

    /// Replace the configured results.
    pub fn set_results(&self, results: Vec<CanonicalMetadata>) {
        *self.results.lock().unwrap() = results;
    }

    /// Number of lookups issued against this provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Titles this provider was queried with, in order.
    pub fn queried_titles(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn key(&self) -> &str {
        &self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    async fn search_title(&self, title: &str) -> Result<Vec<CanonicalMetadata>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().unwrap().push(title.to_string());

        match self.behavior {
            Behavior::Respond => Ok(self.results.lock().unwrap().clone()),
            Behavior::Fail => Err(ProviderError::Network("mock failure".to_string())),
            Behavior::Panic => panic!("mock provider '{}' panicked", self.key),
        }
    }
}

/// Helper function to create mock metadata for testing.
pub fn make_metadata(title: &str) -> CanonicalMetadata {
    CanonicalMetadata::new(ItemType::JournalArticle, title)
}
