//! Text normalization for provider payloads: HTML entity decoding, title
//! cleanup, and personal-name splitting.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|amp|lt|gt|quot|apos|nbsp);")
        .expect("entity pattern is valid")
});

static TRAILING_PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s*$").expect("period pattern is valid"));

// DBLP appends a 4-digit homonym number to disambiguate authors
static DISAMBIGUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d{4}$").expect("suffix pattern is valid"));

/// How a personal name should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMode {
    /// "Last, First" when a comma is present, otherwise the final word is the surname
    Split,
    /// Keep the whole name as the last name
    Verbatim,
}

/// Decode the named entities `&amp; &lt; &gt; &quot; &apos; &nbsp;` and
/// decimal/hex numeric references. Anything unrecognized is left untouched.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => {
                    let code = if let Some(hex) = entity
                        .strip_prefix("#x")
                        .or_else(|| entity.strip_prefix("#X"))
                    {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        entity[1..].parse::<u32>().ok()
                    };
                    code.and_then(char::from_u32)
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Trim and decode entities
pub fn normalize_text(text: &str) -> String {
    decode_entities(text.trim()).trim().to_string()
}

/// Normalize a title and drop the trailing period DBLP puts on every record
pub fn normalize_title(title: &str) -> String {
    let text = normalize_text(title);
    TRAILING_PERIOD_RE.replace(&text, "").trim_end().to_string()
}

/// Normalize an author name and strip a trailing disambiguation number
/// ("Jane Doe 0001" becomes "Jane Doe")
pub fn normalize_author(name: &str) -> String {
    let text = normalize_text(name);
    DISAMBIGUATION_RE.replace(&text, "").into_owned()
}

/// Split a personal name into `(first_name, last_name)`
pub fn split_name(name: &str, mode: NameMode) -> (Option<String>, String) {
    let name = name.trim();
    if mode == NameMode::Verbatim {
        return (None, name.to_string());
    }

    if let Some((last, first)) = name.split_once(',') {
        let first = first.trim();
        return (
            (!first.is_empty()).then(|| first.to_string()),
            last.trim().to_string(),
        );
    }

    let words: Vec<&str> = name.split_whitespace().collect();
    match words.split_last() {
        Some((last, rest)) if !rest.is_empty() => (Some(rest.join(" ")), last.to_string()),
        Some((last, _)) => (None, last.to_string()),
        None => (None, String::new()),
    }
}
