//! Utility modules supporting provider adapters.
//!
//! - [`HttpClient`]: reqwest-backed [`HttpTransport`] with configured timeouts
//! - [`decode_entities`], [`normalize_title`], [`normalize_author`]: cleanup of
//!   provider text fields
//! - [`split_name`]: personal-name splitting into first/last name
//!
//! # Text normalization
//!
//! ```rust
//! use kentridge::utils::{normalize_author, normalize_title, split_name, NameMode};
//!
//! assert_eq!(normalize_title("A &amp; B Study."), "A & B Study");
//! let name = normalize_author("Jane Doe 0001");
//! assert_eq!(split_name(&name, NameMode::Split), (Some("Jane".to_string()), "Doe".to_string()));
//! ```

mod http;
mod text;

pub use http::{HttpClient, HttpResponse, HttpTransport};
pub use text::{
    decode_entities, normalize_author, normalize_text, normalize_title, split_name, NameMode,
};
