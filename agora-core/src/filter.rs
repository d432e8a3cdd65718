//! Query constraints applied to a catalog's current entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Most popular first.
    #[default]
    Popularity,
    /// Most recently updated first.
    Recency,
    /// Alphabetical by name, case-insensitive.
    Name,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Popularity => "popularity",
            SortBy::Recency => "recency",
            SortBy::Name => "name",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a sort key is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl fmt::Display for UnknownSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort key '{}'", self.0)
    }
}

impl std::error::Error for UnknownSortKey {}

impl FromStr for SortBy {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "popularity" | "popular" | "downloads" | "stars" => Ok(SortBy::Popularity),
            "recency" | "recent" | "updated" => Ok(SortBy::Recency),
            "name" | "alphabetical" => Ok(SortBy::Name),
            _ => Err(UnknownSortKey(s.to_string())),
        }
    }
}

/// The set of constraints applied by a catalog query.
///
/// Absent fields place no constraint on their dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-insensitive substring matched against name, description and tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    /// Exact, case-sensitive category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Every listed tag must be present on the entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Popularity floor (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_popularity: Option<u64>,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_min_popularity(mut self, min: u64) -> Self {
        self.min_popularity = Some(min);
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Search term, if present and non-blank.
    pub fn effective_search(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Category constraint, if present and non-empty.
    pub fn effective_category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    /// Popularity floor, defaulting to zero.
    pub fn effective_min_popularity(&self) -> u64 {
        self.min_popularity.unwrap_or(0)
    }

    /// Parse a comma-separated tag list, dropping blanks.
    pub fn parse_tags(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}
