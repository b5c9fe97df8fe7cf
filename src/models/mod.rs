//! Core data models for provider results.

mod metadata;
mod search;

pub use metadata::{CanonicalMetadata, Creator, CreatorType, ItemType, MetadataBuilder};
pub use search::SearchResult;
