use crate::identifier::{derive_id, RelationId};
use crate::shortcode::ShortCode;
use serde::{Deserialize, Serialize};

/// Persisted mapping between a long URL and its short link.
///
/// Relations are immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Identifier derived from `long_url`.
    #[serde(rename = "id")]
    pub long_id: RelationId,
    /// Identifier derived from the short code embedded in `short_url`.
    #[serde(rename = "short_url_id")]
    pub short_id: RelationId,
    /// The URL that was shortened.
    #[serde(rename = "longUrl")]
    pub long_url: String,
    /// The fully qualified short link.
    #[serde(rename = "shortUrl")]
    pub short_url: String,
}

impl Relation {
    /// Builds the relation for `long_url` served under `code` at `base_url`.
    pub fn new(long_url: impl Into<String>, code: &ShortCode, base_url: &str) -> Self {
        let long_url = long_url.into();
        Self {
            long_id: derive_id(&long_url),
            short_id: derive_id(code.as_str()),
            short_url: code.to_url(base_url),
            long_url,
        }
    }
}
