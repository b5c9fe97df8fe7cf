//! # Kentridge
//!
//! Augments bibliographic records with metadata fetched from external
//! providers.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Canonical metadata and provenance-tagged search results
//! - [`providers`]: Metadata provider plugins (DBLP) and the provider registry
//! - [`engine`]: Provider fan-out, the batch selection workflow and reconciliation
//! - [`store`]: The target record abstraction plus in-memory and JSON-file stores
//! - [`config`]: Configuration and the preference read surface
//! - [`ui`]: Terminal selection and reporting surfaces
//! - [`utils`]: HTTP transport and text normalization

pub mod config;
pub mod engine;
pub mod models;
pub mod providers;
pub mod store;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use engine::{BatchWorkflow, Selection, UpdateStrategy};
pub use models::{CanonicalMetadata, SearchResult};
pub use providers::{Provider, ProviderRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
