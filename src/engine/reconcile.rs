//! Merging chosen metadata into a target record.

use serde::{Deserialize, Serialize};

use crate::config::{Preferences, UPDATE_STRATEGY_PREF};
use crate::models::{CanonicalMetadata, Creator, CreatorType};
use crate::store::{StoreError, TargetRecord};

/// How incoming metadata is merged into an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// Overwrite every mapped field whose value differs
    Replace,
    /// Only fill fields that are currently empty
    #[default]
    Supplement,
}

impl UpdateStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStrategy::Replace => "replace",
            UpdateStrategy::Supplement => "supplement",
        }
    }

    /// Read the strategy preference; missing or unknown values give the default
    pub fn from_preferences(prefs: &dyn Preferences) -> Self {
        prefs
            .get_string(UPDATE_STRATEGY_PREF)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UpdateStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(UpdateStrategy::Replace),
            "supplement" => Ok(UpdateStrategy::Supplement),
            other => Err(format!("unknown update strategy '{}'", other)),
        }
    }
}

/// A record field fed from canonical metadata
struct FieldDescriptor {
    name: &'static str,
    value: fn(&CanonicalMetadata) -> Option<&str>,
}

fn title(m: &CanonicalMetadata) -> Option<&str> {
    Some(m.title.as_str())
}

fn date(m: &CanonicalMetadata) -> Option<&str> {
    m.date.as_deref()
}

fn publication_title(m: &CanonicalMetadata) -> Option<&str> {
    m.publication_title.as_deref()
}

fn volume(m: &CanonicalMetadata) -> Option<&str> {
    m.volume.as_deref()
}

fn issue(m: &CanonicalMetadata) -> Option<&str> {
    m.issue.as_deref()
}

fn pages(m: &CanonicalMetadata) -> Option<&str> {
    m.pages.as_deref()
}

fn doi(m: &CanonicalMetadata) -> Option<&str> {
    m.doi.as_deref()
}

fn url(m: &CanonicalMetadata) -> Option<&str> {
    m.url.as_deref()
}

fn abstract_note(m: &CanonicalMetadata) -> Option<&str> {
    m.abstract_note.as_deref()
}

const MAPPED_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor { name: "title", value: title },
    FieldDescriptor { name: "date", value: date },
    FieldDescriptor { name: "publicationTitle", value: publication_title },
    FieldDescriptor { name: "volume", value: volume },
    FieldDescriptor { name: "issue", value: issue },
    FieldDescriptor { name: "pages", value: pages },
    FieldDescriptor { name: "DOI", value: doi },
    FieldDescriptor { name: "url", value: url },
    FieldDescriptor { name: "abstractNote", value: abstract_note },
];

/// Names of the record fields reconciliation writes
pub fn mapped_field_names() -> impl Iterator<Item = &'static str> {
    MAPPED_FIELDS.iter().map(|f| f.name)
}

/// What a reconciliation call changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub changed_fields: Vec<&'static str>,
    pub item_type_changed: bool,
    pub creators_changed: bool,
    pub saved: bool,
}

impl ReconcileOutcome {
    /// True when the record was left untouched
    pub fn is_noop(&self) -> bool {
        self.changed_fields.is_empty() && !self.item_type_changed && !self.creators_changed
    }
}

/// Ordered `(creatorType, firstName, lastName)` triples of a creator list
pub fn creator_signature(creators: &[Creator]) -> Vec<(CreatorType, &str, &str)> {
    creators
        .iter()
        .map(|c| {
            (
                c.creator_type,
                c.first_name.as_deref().unwrap_or(""),
                c.last_name.as_str(),
            )
        })
        .collect()
}

/// Merge `metadata` into `record` and save it once if anything changed.
///
/// Both strategies compare before writing, so applying the same metadata
/// again changes nothing and issues no save.
pub async fn reconcile<R>(
    record: &mut R,
    metadata: &CanonicalMetadata,
    strategy: UpdateStrategy,
) -> Result<ReconcileOutcome, StoreError>
where
    R: TargetRecord + ?Sized,
{
    let mut outcome = ReconcileOutcome::default();

    for field in MAPPED_FIELDS {
        let incoming = (field.value)(metadata).map(str::trim).unwrap_or("");
        let current = record.get_field(field.name);
        let current = current.trim();

        let write = match strategy {
            UpdateStrategy::Replace => incoming != current,
            UpdateStrategy::Supplement => current.is_empty() && !incoming.is_empty(),
        };

        if write {
            record.set_field(field.name, incoming);
            outcome.changed_fields.push(field.name);
        }
    }

    match record.resolve_item_type(metadata.item_type.as_str()) {
        Some(type_id) => {
            let write = match strategy {
                UpdateStrategy::Replace => record.item_type() != Some(type_id),
                UpdateStrategy::Supplement => !record.has_item_type(),
            };
            if write {
                record.set_item_type(type_id);
                outcome.item_type_changed = true;
            }
        }
        None => tracing::warn!("Unknown item type '{}', leaving type unchanged", metadata.item_type),
    }

    let current_creators = record.creators();
    let write = match strategy {
        UpdateStrategy::Replace => {
            creator_signature(&current_creators) != creator_signature(&metadata.creators)
        }
        UpdateStrategy::Supplement => current_creators.is_empty() && !metadata.creators.is_empty(),
    };
    if write {
        record.set_creators(metadata.creators.clone());
        outcome.creators_changed = true;
    }

    if !outcome.is_noop() {
        record.save().await?;
        outcome.saved = true;
    }

    tracing::debug!(
        "Reconciled with {} strategy: fields={:?} type={} creators={}",
        strategy,
        outcome.changed_fields,
        outcome.item_type_changed,
        outcome.creators_changed
    );

    Ok(outcome)
}
