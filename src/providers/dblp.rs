//! DBLP metadata provider implementation.
//!
//! Uses the DBLP publication search API in JSON mode.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{CanonicalMetadata, Creator, CreatorType, ItemType, MetadataBuilder};
use crate::providers::{Provider, ProviderError};
use crate::utils::{
    normalize_author, normalize_text, normalize_title, split_name, HttpTransport, NameMode,
};

const DBLP_SEARCH_URL: &str = "https://dblp.org/search/publ/api";

/// DBLP metadata provider
#[derive(Debug, Clone)]
pub struct DblpProvider {
    client: Arc<dyn HttpTransport>,
    search_url: String,
    api_key: Option<String>,
}

impl DblpProvider {
    pub fn new(client: Arc<dyn HttpTransport>, api_key: Option<String>) -> Self {
        Self {
            client,
            search_url: DBLP_SEARCH_URL.to_string(),
            api_key,
        }
    }

    /// Point the provider at a different search endpoint (mirrors, tests)
    pub fn with_search_url(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = search_url.into();
        self
    }

    fn search_url_for(&self, title: &str) -> String {
        format!(
            "{}?q={}&format=json",
            self.search_url,
            urlencoding::encode(title)
        )
    }
}

#[async_trait]
impl Provider for DblpProvider {
    fn key(&self) -> &str {
        "dblp"
    }

    fn name(&self) -> &str {
        "DBLP"
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    async fn search_title(&self, title: &str) -> Result<Vec<CanonicalMetadata>, ProviderError> {
        let url = self.search_url_for(title);
        tracing::debug!("Fetching from DBLP: {}", url);

        let response = self.client.get(&url).await?;

        if response.status != 200 || response.body.is_empty() {
            tracing::debug!("DBLP request failed with status {}", response.status);
            return Ok(Vec::new());
        }

        parse_response(&response.body)
    }
}

// ========== Wire format ==========

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<ResultBlock>,
}

#[derive(Debug, Deserialize)]
struct ResultBlock {
    hits: Option<Hits>,
}

#[derive(Debug, Deserialize)]
struct Hits {
    hit: Option<OneOrMany<Hit>>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    info: HitInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HitInfo {
    #[serde(rename = "type")]
    kind: Option<String>,
    key: Option<String>,
    title: Option<Scalar>,
    authors: Option<Authors>,
    year: Option<Scalar>,
    venue: Option<OneOrMany<String>>,
    volume: Option<Scalar>,
    number: Option<Scalar>,
    pages: Option<Scalar>,
    doi: Option<String>,
    ee: Option<OneOrMany<String>>,
}

#[derive(Debug, Deserialize)]
struct Authors {
    author: OneOrMany<Author>,
}

/// An author is either a bare name or an object carrying the name in `text`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Author {
    Name(String),
    Tagged { text: String },
}

impl Author {
    fn name(&self) -> &str {
        match self {
            Author::Name(name) => name,
            Author::Tagged { text } => text,
        }
    }
}

/// DBLP collapses single-element arrays into a bare value
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Fields that DBLP sometimes emits as numbers instead of strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(text) => text,
            Scalar::Number(number) => number.to_string(),
        }
    }
}

// ========== Mapping ==========

/// Parse a DBLP search response body into canonical metadata.
///
/// A body without `result.hits.hit` is a valid empty result.
fn parse_response(body: &str) -> Result<Vec<CanonicalMetadata>, ProviderError> {
    let envelope: Envelope = serde_json::from_str(body)?;

    let hits = envelope
        .result
        .and_then(|r| r.hits)
        .and_then(|h| h.hit)
        .map(OneOrMany::into_vec)
        .unwrap_or_default();

    Ok(hits.into_iter().map(|hit| to_metadata(hit.info)).collect())
}

fn to_metadata(info: HitInfo) -> CanonicalMetadata {
    let creators = info
        .authors
        .map(|a| a.author.into_vec())
        .unwrap_or_default()
        .iter()
        .map(|author| {
            let name = normalize_author(author.name());
            let (first_name, last_name) = split_name(&name, NameMode::Split);
            Creator::new(CreatorType::Author, first_name, last_name)
        })
        .collect();

    let title = info
        .title
        .map(|t| normalize_title(&t.into_string()))
        .unwrap_or_default();

    let venue = info
        .venue
        .map(|v| normalize_text(&v.into_vec().join(", ")));

    let mut builder = MetadataBuilder::new(map_type(info.kind.as_deref()), title)
        .creators(creators)
        .date(info.year.map(Scalar::into_string))
        .publication_title(venue)
        .volume(info.volume.map(Scalar::into_string))
        .issue(info.number.map(Scalar::into_string))
        .pages(info.pages.map(Scalar::into_string))
        .doi(info.doi)
        .url(info.ee.and_then(|ee| ee.into_vec().into_iter().next()));

    if let Some(key) = info.key {
        builder = builder.extra("dblpKey", serde_json::Value::String(key));
    }

    builder.build()
}

/// Map a DBLP publication type label onto an item type
fn map_type(kind: Option<&str>) -> ItemType {
    match kind {
        Some("Conference and Workshop Papers") => ItemType::ConferencePaper,
        Some("Journal Articles") => ItemType::JournalArticle,
        Some("Book Chapters") => ItemType::BookSection,
        Some("Books") => ItemType::Book,
        _ => ItemType::Document,
    }
}
