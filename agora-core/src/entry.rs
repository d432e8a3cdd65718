//! Canonical catalog entry shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Placeholder substituted for upstream fields that are missing.
pub const UNKNOWN: &str = "Unknown";

/// Well-known attribute keys populated by normalizers.
pub mod attr {
    pub const LANGUAGE: &str = "language";
    pub const SIZE: &str = "size";
    pub const LICENSE: &str = "license";
    pub const AUTHOR: &str = "author";
    pub const FORMAT: &str = "format";
    pub const LIBRARY: &str = "library";
}

/// Which upstream slot produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceName {
    /// The catalog's main provider.
    Primary,
    /// A secondary provider, usually requiring credentials.
    Secondary,
    /// A public open-data provider.
    Public,
    /// The bundled static fallback set.
    Fallback,
}

impl SourceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::Primary => "primary",
            SourceName::Secondary => "secondary",
            SourceName::Public => "public",
            SourceName::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item in a catalog after normalization.
///
/// The shape is identical across catalogs; provider-specific display fields
/// live in `attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Stable identity key, unique within a catalog after deduplication.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Upstream slot that produced this entry.
    pub source_name: SourceName,
    /// Tags in upstream order. Matching ignores order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Single classification used for exact-match filtering.
    pub category: String,
    /// Download, star, like or run count.
    #[serde(default)]
    pub popularity: u64,
    /// When the upstream resource last changed.
    pub last_updated: Timestamp,
    /// Canonical link to the upstream resource.
    pub url: String,
    /// Provider-specific display fields (language, size, license, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl CatalogEntry {
    /// Returns true if the entry carries the given tag (exact match).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Look up an attribute, falling back to [`UNKNOWN`].
    pub fn attribute(&self, key: &str) -> &str {
        self.attributes.get(key).map(String::as_str).unwrap_or(UNKNOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epoch;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            id: "openai/whisper".to_string(),
            name: "whisper".to_string(),
            description: "Speech recognition".to_string(),
            source_name: SourceName::Primary,
            tags: vec!["audio".to_string(), "asr".to_string()],
            category: "audio".to_string(),
            popularity: 42,
            last_updated: epoch(),
            url: "https://huggingface.co/openai/whisper".to_string(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_has_tag_is_exact() {
        let e = entry();
        assert!(e.has_tag("asr"));
        assert!(!e.has_tag("ASR"));
        assert!(!e.has_tag("as"));
    }

    #[test]
    fn test_missing_attribute_reads_unknown() {
        let mut e = entry();
        assert_eq!(e.attribute(attr::LICENSE), UNKNOWN);
        e.attributes
            .insert(attr::LICENSE.to_string(), "mit".to_string());
        assert_eq!(e.attribute(attr::LICENSE), "mit");
    }

    #[test]
    fn test_serializes_camel_case() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(entry())?;
        assert_eq!(json["sourceName"], "primary");
        assert!(json.get("lastUpdated").is_some());
        Ok(())
    }
}
