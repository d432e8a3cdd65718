//! Catalog identity.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// One independently cached collection of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Datasets,
    Repositories,
    Models,
}

impl CatalogKind {
    /// All catalogs, in display order.
    pub const ALL: [CatalogKind; 3] = [
        CatalogKind::Datasets,
        CatalogKind::Repositories,
        CatalogKind::Models,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Datasets => "datasets",
            CatalogKind::Repositories => "repositories",
            CatalogKind::Models => "models",
        }
    }

    /// Default maximum age of cached data before a refresh is forced.
    ///
    /// Repository listings move quickly (stars, pushes) so they refresh
    /// hourly; dataset and model hubs refresh daily.
    pub fn default_stale_threshold(&self) -> Duration {
        match self {
            CatalogKind::Datasets | CatalogKind::Models => Duration::from_secs(24 * 60 * 60),
            CatalogKind::Repositories => Duration::from_secs(60 * 60),
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "datasets" | "dataset" => Ok(CatalogKind::Datasets),
            "repositories" | "repository" | "repos" => Ok(CatalogKind::Repositories),
            "models" | "model" => Ok(CatalogKind::Models),
            _ => Err(CatalogError::UnknownCatalog {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog_names() {
        assert_eq!("datasets".parse::<CatalogKind>().ok(), Some(CatalogKind::Datasets));
        assert_eq!("Models".parse::<CatalogKind>().ok(), Some(CatalogKind::Models));
        assert_eq!("repos".parse::<CatalogKind>().ok(), Some(CatalogKind::Repositories));
        assert!(matches!(
            "blog".parse::<CatalogKind>(),
            Err(CatalogError::UnknownCatalog { .. })
        ));
    }

    #[test]
    fn test_default_thresholds() {
        assert_eq!(
            CatalogKind::Repositories.default_stale_threshold(),
            Duration::from_secs(3600)
        );
        assert_eq!(
            CatalogKind::Datasets.default_stale_threshold(),
            Duration::from_secs(86_400)
        );
        assert_eq!(
            CatalogKind::Models.default_stale_threshold(),
            CatalogKind::Datasets.default_stale_threshold()
        );
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for kind in CatalogKind::ALL {
            assert_eq!(kind.to_string().parse::<CatalogKind>().ok(), Some(kind));
        }
    }
}
