//! Target record store abstraction.
//!
//! The engine never owns records. It reads and mutates them through
//! [`TargetRecord`] and commits each record with a single [`TargetRecord::save`].

mod json;
mod memory;

pub use json::{JsonLibrary, JsonRecord};
pub use memory::MemoryRecord;

use async_trait::async_trait;

use crate::models::Creator;

/// Numeric identifier of an item type in the record store
pub type ItemTypeId = u16;

/// Item types known to the store, by host type name
pub const ITEM_TYPES: &[(&str, ItemTypeId)] = &[
    ("artwork", 1),
    ("book", 2),
    ("bookSection", 3),
    ("conferencePaper", 4),
    ("document", 5),
    ("journalArticle", 6),
    ("magazineArticle", 7),
    ("manuscript", 8),
    ("newspaperArticle", 9),
    ("patent", 10),
    ("preprint", 11),
    ("report", 12),
    ("thesis", 13),
    ("webpage", 14),
];

/// Look up the id of a type name
pub fn item_type_id(name: &str) -> Option<ItemTypeId> {
    ITEM_TYPES
        .iter()
        .find(|(type_name, _)| *type_name == name)
        .map(|(_, id)| *id)
}

/// Look up the type name of an id
pub fn item_type_name(id: ItemTypeId) -> Option<&'static str> {
    ITEM_TYPES
        .iter()
        .find(|(_, type_id)| *type_id == id)
        .map(|(name, _)| *name)
}

/// A record owned by an external store
#[async_trait]
pub trait TargetRecord: Send + Sync {
    /// Current value of a field; missing fields read as ""
    fn get_field(&self, name: &str) -> String;

    fn set_field(&mut self, name: &str, value: &str);

    /// Creators in order
    fn creators(&self) -> Vec<Creator>;

    fn set_creators(&mut self, creators: Vec<Creator>);

    /// Current item type, if set and known to this store
    fn item_type(&self) -> Option<ItemTypeId>;

    /// Whether the record carries any item type, known to this store or not
    fn has_item_type(&self) -> bool {
        self.item_type().is_some()
    }

    fn set_item_type(&mut self, id: ItemTypeId);

    /// Resolve a type name to this store's id
    fn resolve_item_type(&self, name: &str) -> Option<ItemTypeId> {
        item_type_id(name)
    }

    /// Commit all pending mutations as one unit
    async fn save(&mut self) -> Result<(), StoreError>;
}

/// Errors raised by a record store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_lookup() {
        assert_eq!(item_type_id("journalArticle"), Some(6));
        assert_eq!(item_type_name(6), Some("journalArticle"));
        assert_eq!(item_type_id("hologram"), None);
        assert_eq!(item_type_name(999), None);
    }

    #[test]
    fn test_every_model_item_type_resolves() {
        use crate::models::ItemType;

        for item_type in [
            ItemType::JournalArticle,
            ItemType::ConferencePaper,
            ItemType::BookSection,
            ItemType::Book,
            ItemType::Document,
        ] {
            assert!(item_type_id(item_type.as_str()).is_some(), "{}", item_type);
        }
    }
}
