//! Bundled static fallback data.
//!
//! Each catalog ships a small, versioned JSON document compiled into the
//! binary. It is served only on a cold start when every upstream source
//! comes back empty. The document is parsed and validated on first use; a
//! document that fails validation is a build defect and is reported as
//! [`CatalogError::MalformedFallback`].

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use agora_core::{CatalogEntry, CatalogError, CatalogKind, CatalogResult, SourceName};
use once_cell::sync::OnceCell;
use serde::Deserialize;

/// Format version every bundled fallback document must declare.
pub const FALLBACK_VERSION: u32 = 1;

const DATASETS_JSON: &str = include_str!("../../fallback/datasets.json");
const REPOSITORIES_JSON: &str = include_str!("../../fallback/repositories.json");
const MODELS_JSON: &str = include_str!("../../fallback/models.json");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FallbackDocument {
    version: u32,
    catalog: CatalogKind,
    entries: Vec<CatalogEntry>,
}

#[derive(Debug)]
enum FallbackData {
    Json(Cow<'static, str>),
    Entries(Vec<CatalogEntry>),
}

/// A catalog's static fallback entries, validated lazily.
#[derive(Debug)]
pub struct FallbackSet {
    catalog: CatalogKind,
    data: FallbackData,
    loaded: OnceCell<Arc<[CatalogEntry]>>,
}

impl FallbackSet {
    /// The fallback document bundled for `catalog`.
    pub fn bundled(catalog: CatalogKind) -> Self {
        let raw = match catalog {
            CatalogKind::Datasets => DATASETS_JSON,
            CatalogKind::Repositories => REPOSITORIES_JSON,
            CatalogKind::Models => MODELS_JSON,
        };
        Self::from_json(catalog, raw)
    }

    /// A fallback set read from a JSON document.
    pub fn from_json(catalog: CatalogKind, json: impl Into<Cow<'static, str>>) -> Self {
        Self {
            catalog,
            data: FallbackData::Json(json.into()),
            loaded: OnceCell::new(),
        }
    }

    /// A fallback set built from entries directly. Entries are still
    /// validated on first load.
    pub fn from_entries(catalog: CatalogKind, entries: Vec<CatalogEntry>) -> Self {
        Self {
            catalog,
            data: FallbackData::Entries(entries),
            loaded: OnceCell::new(),
        }
    }

    pub fn catalog(&self) -> CatalogKind {
        self.catalog
    }

    /// Parse and validate on first call, then return the shared entries.
    pub fn load(&self) -> CatalogResult<Arc<[CatalogEntry]>> {
        self.loaded
            .get_or_try_init(|| self.parse().map(Arc::from))
            .map(Arc::clone)
    }

    /// Validate without keeping a handle. Returns the entry count.
    pub fn validate(&self) -> CatalogResult<usize> {
        self.load().map(|entries| entries.len())
    }

    fn parse(&self) -> CatalogResult<Vec<CatalogEntry>> {
        let entries = match &self.data {
            FallbackData::Entries(entries) => entries.clone(),
            FallbackData::Json(raw) => {
                let doc: FallbackDocument =
                    serde_json::from_str(raw).map_err(|e| self.malformed(e.to_string()))?;
                if doc.version != FALLBACK_VERSION {
                    return Err(self.malformed(format!(
                        "unsupported version {} (expected {})",
                        doc.version, FALLBACK_VERSION
                    )));
                }
                if doc.catalog != self.catalog {
                    return Err(self.malformed(format!(
                        "document is for catalog {}",
                        doc.catalog
                    )));
                }
                doc.entries
            }
        };
        self.check(&entries)?;
        Ok(entries)
    }

    fn check(&self, entries: &[CatalogEntry]) -> CatalogResult<()> {
        if entries.is_empty() {
            return Err(self.malformed("no entries".to_string()));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(self.malformed(format!("entry {i} has an empty id")));
            }
            if entry.name.trim().is_empty() {
                return Err(self.malformed(format!("entry {} has an empty name", entry.id)));
            }
            if entry.url.trim().is_empty() {
                return Err(self.malformed(format!("entry {} has an empty url", entry.id)));
            }
            if entry.source_name != SourceName::Fallback {
                return Err(self.malformed(format!(
                    "entry {} has source {} (expected fallback)",
                    entry.id, entry.source_name
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(self.malformed(format!("duplicate id {}", entry.id)));
            }
        }
        Ok(())
    }

    fn malformed(&self, reason: String) -> CatalogError {
        CatalogError::MalformedFallback {
            catalog: self.catalog,
            reason,
        }
    }
}
