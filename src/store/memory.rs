//! In-process record with write accounting.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{item_type_id, ItemTypeId, StoreError, TargetRecord};
use crate::models::Creator;

/// A record held in memory.
///
/// Counts every mutation and save so callers can check that no-op
/// reconciliations really issue no writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecord {
    fields: BTreeMap<String, String>,
    creators: Vec<Creator>,
    item_type: Option<ItemTypeId>,
    dirty: bool,
    fail_save: bool,
    saves: usize,
    field_writes: usize,
    creator_writes: usize,
    type_writes: usize,
}

impl MemoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record with only a title set
    pub fn titled(title: &str) -> Self {
        Self::new().with_field("title", title)
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_creators(mut self, creators: Vec<Creator>) -> Self {
        self.creators = creators;
        self
    }

    /// Set the initial type by name; unknown names leave it unset
    pub fn with_item_type(mut self, name: &str) -> Self {
        self.item_type = item_type_id(name);
        self
    }

    /// Make every save fail
    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves
    }

    pub fn field_writes(&self) -> usize {
        self.field_writes
    }

    pub fn creator_writes(&self) -> usize {
        self.creator_writes
    }

    pub fn type_writes(&self) -> usize {
        self.type_writes
    }

    /// Whether there are unsaved mutations
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[async_trait]
impl TargetRecord for MemoryRecord {
    fn get_field(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    fn set_field(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.to_string());
        self.field_writes += 1;
        self.dirty = true;
    }

    fn creators(&self) -> Vec<Creator> {
        self.creators.clone()
    }

    fn set_creators(&mut self, creators: Vec<Creator>) {
        self.creators = creators;
        self.creator_writes += 1;
        self.dirty = true;
    }

    fn item_type(&self) -> Option<ItemTypeId> {
        self.item_type
    }

    fn set_item_type(&mut self, id: ItemTypeId) {
        self.item_type = Some(id);
        self.type_writes += 1;
        self.dirty = true;
    }

    async fn save(&mut self) -> Result<(), StoreError> {
        if self.fail_save {
            return Err(StoreError::Other("save rejected".to_string()));
        }
        self.saves += 1;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_record_accounting() {
        let mut record = MemoryRecord::titled("Old").with_item_type("book");
        assert_eq!(record.get_field("title"), "Old");
        assert_eq!(record.get_field("DOI"), "");
        assert_eq!(record.item_type(), item_type_id("book"));

        record.set_field("title", "New");
        record.set_creators(vec![Creator::author("Jane", "Doe")]);
        assert!(record.is_dirty());
        assert_eq!(record.field_writes(), 1);
        assert_eq!(record.creator_writes(), 1);

        record.save().await.unwrap();
        assert!(!record.is_dirty());
        assert_eq!(record.saves(), 1);
    }

    #[tokio::test]
    async fn test_failing_save() {
        let mut record = MemoryRecord::titled("T").failing_save();
        assert!(record.save().await.is_err());
        assert_eq!(record.saves(), 0);
    }
}
