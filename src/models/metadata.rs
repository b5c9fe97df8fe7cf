//! Canonical metadata model shared by every provider.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Item types a provider result can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
    JournalArticle,
    ConferencePaper,
    BookSection,
    Book,
    Document,
}

impl ItemType {
    /// Returns the host's type name for this item type
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::JournalArticle => "journalArticle",
            ItemType::ConferencePaper => "conferencePaper",
            ItemType::BookSection => "bookSection",
            ItemType::Book => "book",
            ItemType::Document => "document",
        }
    }
}

impl Default for ItemType {
    fn default() -> Self {
        ItemType::Document
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles a creator can have on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CreatorType {
    Author,
    Contributor,
    Editor,
    Translator,
    SeriesEditor,
    Interviewee,
    Interviewer,
    Director,
    Scriptwriter,
    Producer,
    CastMember,
    Sponsor,
    Cosponsor,
    WordsBy,
    Performer,
    Composer,
    Artist,
    Commenter,
    BookAuthor,
    Counsel,
    Recipient,
    ReviewedAuthor,
}

impl CreatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatorType::Author => "author",
            CreatorType::Contributor => "contributor",
            CreatorType::Editor => "editor",
            CreatorType::Translator => "translator",
            CreatorType::SeriesEditor => "seriesEditor",
            CreatorType::Interviewee => "interviewee",
            CreatorType::Interviewer => "interviewer",
            CreatorType::Director => "director",
            CreatorType::Scriptwriter => "scriptwriter",
            CreatorType::Producer => "producer",
            CreatorType::CastMember => "castMember",
            CreatorType::Sponsor => "sponsor",
            CreatorType::Cosponsor => "cosponsor",
            CreatorType::WordsBy => "wordsBy",
            CreatorType::Performer => "performer",
            CreatorType::Composer => "composer",
            CreatorType::Artist => "artist",
            CreatorType::Commenter => "commenter",
            CreatorType::BookAuthor => "bookAuthor",
            CreatorType::Counsel => "counsel",
            CreatorType::Recipient => "recipient",
            CreatorType::ReviewedAuthor => "reviewedAuthor",
        }
    }
}

impl Default for CreatorType {
    fn default() -> Self {
        CreatorType::Author
    }
}

impl std::fmt::Display for CreatorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single creator. Order inside a creator list is author order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default)]
    pub creator_type: CreatorType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    pub last_name: String,
}

impl Creator {
    pub fn new(
        creator_type: CreatorType,
        first_name: Option<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            creator_type,
            first_name,
            last_name: last_name.into(),
        }
    }

    /// Shorthand for an `author` creator
    pub fn author(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let first_name = first_name.into();
        Self::new(
            CreatorType::Author,
            (!first_name.is_empty()).then_some(first_name),
            last_name,
        )
    }

    /// "Last, First" rendering used for display
    pub fn display_name(&self) -> String {
        match &self.first_name {
            Some(first) if !first.is_empty() => format!("{}, {}", self.last_name, first),
            _ => self.last_name.clone(),
        }
    }
}

/// Provider-agnostic metadata for one bibliographic item
///
/// `title` and `item_type` are always present (the title may be empty) and
/// `creators` is never absent, only empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalMetadata {
    pub item_type: ItemType,

    pub title: String,

    #[serde(default)]
    pub creators: Vec<Creator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,

    #[serde(rename = "DOI", default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_note: Option<String>,

    /// Provider-specific fields; never written to a record
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CanonicalMetadata {
    pub fn new(item_type: ItemType, title: impl Into<String>) -> Self {
        Self {
            item_type,
            title: title.into(),
            ..Default::default()
        }
    }

    /// Creators joined as "Last, First; Last, First"
    pub fn creator_summary(&self) -> String {
        self.creators
            .iter()
            .map(Creator::display_name)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Builder for creating CanonicalMetadata instances
pub struct MetadataBuilder {
    metadata: CanonicalMetadata,
}

impl MetadataBuilder {
    /// Create a new builder with required fields
    pub fn new(item_type: ItemType, title: impl Into<String>) -> Self {
        Self {
            metadata: CanonicalMetadata::new(item_type, title),
        }
    }

    pub fn creators(mut self, creators: Vec<Creator>) -> Self {
        self.metadata.creators = creators;
        self
    }

    pub fn creator(mut self, creator: Creator) -> Self {
        self.metadata.creators.push(creator);
        self
    }

    pub fn date(mut self, date: Option<String>) -> Self {
        self.metadata.date = date;
        self
    }

    pub fn publication_title(mut self, publication_title: Option<String>) -> Self {
        self.metadata.publication_title = publication_title;
        self
    }

    pub fn volume(mut self, volume: Option<String>) -> Self {
        self.metadata.volume = volume;
        self
    }

    pub fn issue(mut self, issue: Option<String>) -> Self {
        self.metadata.issue = issue;
        self
    }

    pub fn pages(mut self, pages: Option<String>) -> Self {
        self.metadata.pages = pages;
        self
    }

    pub fn doi(mut self, doi: Option<String>) -> Self {
        self.metadata.doi = doi;
        self
    }

    pub fn url(mut self, url: Option<String>) -> Self {
        self.metadata.url = url;
        self
    }

    pub fn abstract_note(mut self, abstract_note: Option<String>) -> Self {
        self.metadata.abstract_note = abstract_note;
        self
    }

    /// Add extra metadata
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.extra.insert(key.into(), value);
        self
    }

    /// Build the CanonicalMetadata
    pub fn build(self) -> CanonicalMetadata {
        self.metadata
    }
}
