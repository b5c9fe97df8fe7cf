//! JSON file record store.
//!
//! The library file is an array of records:
//!
//! ```json
//! [
//!   {
//!     "itemType": "journalArticle",
//!     "title": "Deep Learning",
//!     "creators": [{"creatorType": "author", "firstName": "Jane", "lastName": "Doe"}],
//!     "DOI": "10.1000/xyz"
//!   }
//! ]
//! ```
//!
//! Every key other than `itemType` and `creators` is a record field. Numbers
//! and booleans read as their JSON text; nested values are kept as they are
//! and read as blank.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{item_type_id, item_type_name, ItemTypeId, StoreError, TargetRecord};
use crate::models::Creator;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item_type: Option<String>,

    #[serde(default)]
    creators: Vec<Creator>,

    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

/// A library of records backed by one JSON file
#[derive(Debug, Clone)]
pub struct JsonLibrary {
    path: PathBuf,
    records: Arc<Mutex<Vec<RecordData>>>,
}

impl JsonLibrary {
    /// Load a library file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)?;
        let records: Vec<RecordData> = serde_json::from_str(&content)?;

        tracing::debug!("Loaded {} records from {}", records.len(), path.display());

        Ok(Self {
            path,
            records: Arc::new(Mutex::new(records)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records in the library
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    /// Working copies of every record
    pub fn records(&self) -> Result<Vec<JsonRecord>, StoreError> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .enumerate()
            .map(|(index, data)| JsonRecord {
                index,
                data: data.clone(),
                library: self.clone(),
            })
            .collect())
    }

    /// Working copy of one record
    pub fn record(&self, index: usize) -> Result<JsonRecord, StoreError> {
        let records = self.lock()?;
        let data = records
            .get(index)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("index {}", index)))?;

        Ok(JsonRecord {
            index,
            data,
            library: self.clone(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<RecordData>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Other("library lock poisoned".to_string()))
    }

    /// Replace one record and rewrite the file atomically
    async fn commit(&self, index: usize, data: RecordData) -> Result<(), StoreError> {
        let content = {
            let mut records = self.lock()?;
            let slot = records
                .get_mut(index)
                .ok_or_else(|| StoreError::NotFound(format!("index {}", index)))?;
            *slot = data;
            serde_json::to_string_pretty(&*records)?
        };

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &content))
            .await
            .map_err(|e| StoreError::Other(format!("write task failed: {}", e)))?
    }
}

fn write_atomically(path: &Path, content: &str) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;
    file.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Working copy of one library record; [`TargetRecord::save`] writes it back
#[derive(Debug, Clone)]
pub struct JsonRecord {
    index: usize,
    data: RecordData,
    library: JsonLibrary,
}

impl JsonRecord {
    /// Position of this record in the library
    pub fn index(&self) -> usize {
        self.index
    }

    /// Type name of this record, if set
    pub fn item_type_name(&self) -> Option<&str> {
        self.data.item_type.as_deref()
    }
}

#[async_trait]
impl TargetRecord for JsonRecord {
    fn get_field(&self, name: &str) -> String {
        match self.data.fields.get(name) {
            Some(Value::String(value)) => value.clone(),
            Some(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
            _ => String::new(),
        }
    }

    fn set_field(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            self.data.fields.remove(name);
        } else {
            self.data
                .fields
                .insert(name.to_string(), Value::String(value.to_string()));
        }
    }

    fn creators(&self) -> Vec<Creator> {
        self.data.creators.clone()
    }

    fn set_creators(&mut self, creators: Vec<Creator>) {
        self.data.creators = creators;
    }

    fn item_type(&self) -> Option<ItemTypeId> {
        self.data.item_type.as_deref().and_then(item_type_id)
    }

    fn has_item_type(&self) -> bool {
        self.data
            .item_type
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }

    fn set_item_type(&mut self, id: ItemTypeId) {
        if let Some(name) = item_type_name(id) {
            self.data.item_type = Some(name.to_string());
        }
    }

    async fn save(&mut self) -> Result<(), StoreError> {
        self.library.commit(self.index, self.data.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LIBRARY: &str = r#"[
        {"itemType": "book", "title": "First", "creators": []},
        {"title": "Second", "DOI": "10.1/two",
         "creators": [{"creatorType": "author", "firstName": "Jane", "lastName": "Doe"}]}
    ]"#;

    #[tokio::test]
    async fn test_load_and_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");
        std::fs::write(&path, LIBRARY).unwrap();

        let library = JsonLibrary::load(&path).unwrap();
        assert_eq!(library.len().unwrap(), 2);

        let mut records = library.records().unwrap();
        assert_eq!(records[0].get_field("title"), "First");
        assert_eq!(records[0].item_type(), item_type_id("book"));
        assert_eq!(records[1].get_field("DOI"), "10.1/two");
        assert_eq!(records[1].creators()[0].last_name, "Doe");
        assert_eq!(records[1].item_type(), None);

        records[1].set_field("title", "Second, revised");
        records[1].set_field("DOI", "");
        records[1].set_item_type(item_type_id("conferencePaper").unwrap());
        records[1].save().await.unwrap();

        let reloaded = JsonLibrary::load(&path).unwrap();
        let second = reloaded.record(1).unwrap();
        assert_eq!(second.get_field("title"), "Second, revised");
        assert_eq!(second.get_field("DOI"), "");
        assert_eq!(second.item_type_name(), Some("conferencePaper"));
        assert_eq!(reloaded.record(0).unwrap().get_field("title"), "First");
    }

    #[tokio::test]
    async fn test_unsaved_changes_are_not_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");
        std::fs::write(&path, LIBRARY).unwrap();

        let library = JsonLibrary::load(&path).unwrap();
        let mut first = library.record(0).unwrap();
        first.set_field("title", "Changed");

        let reloaded = JsonLibrary::load(&path).unwrap();
        assert_eq!(reloaded.record(0).unwrap().get_field("title"), "First");
    }

    #[tokio::test]
    async fn test_non_string_values_survive_a_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");
        std::fs::write(
            &path,
            r#"[{"title": "T", "creators": [], "year": 2021, "volume": 7,
                 "extra": {"tags": ["a", "b"]}, "archived": null}]"#,
        )
        .unwrap();

        let library = JsonLibrary::load(&path).unwrap();
        let mut record = library.record(0).unwrap();
        assert_eq!(record.get_field("year"), "2021");
        assert_eq!(record.get_field("volume"), "7");
        assert_eq!(record.get_field("extra"), "");
        assert_eq!(record.get_field("archived"), "");

        record.set_field("title", "T, revised");
        record.save().await.unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let saved = &raw[0];
        assert_eq!(saved["title"], "T, revised");
        assert_eq!(saved["year"], 2021);
        assert_eq!(saved["volume"], 7);
        assert_eq!(saved["extra"]["tags"][1], "b");
        assert!(saved["archived"].is_null());
    }

    #[tokio::test]
    async fn test_supplement_keeps_an_unrecognized_item_type() {
        use crate::engine::{reconcile, UpdateStrategy};
        use crate::models::{CanonicalMetadata, ItemType};

        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");
        std::fs::write(&path, r#"[{"itemType": "letter", "title": "My Letter", "creators": []}]"#)
            .unwrap();

        let library = JsonLibrary::load(&path).unwrap();
        let mut record = library.record(0).unwrap();
        assert_eq!(record.item_type(), None);
        assert!(record.has_item_type());

        let metadata = CanonicalMetadata::new(ItemType::ConferencePaper, "My Letter");
        let outcome = reconcile(&mut record, &metadata, UpdateStrategy::Supplement)
            .await
            .unwrap();

        assert!(!outcome.item_type_changed);
        assert_eq!(record.item_type_name(), Some("letter"));

        let mut blank = JsonLibrary::load(&path).unwrap().record(0).unwrap();
        blank.data.item_type = Some("  ".to_string());
        assert!(!blank.has_item_type());
    }

    #[test]
    fn test_missing_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");
        std::fs::write(&path, "[]").unwrap();

        let library = JsonLibrary::load(&path).unwrap();
        assert!(library.is_empty().unwrap());
        assert!(matches!(library.record(0), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            JsonLibrary::load("/nonexistent/library.json"),
            Err(StoreError::Io(_))
        ));

        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(JsonLibrary::load(&path), Err(StoreError::Json(_))));
    }
}
