//! Area categories and area identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference layers that take part in spatial resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum AreaCategory {
    /// 5x5 km atlas grid cell
    Atlas5x5,
    /// 10x10 km atlas grid cell
    Atlas10x10,
    /// Country region (e.g. Götaland, Svealand, Norrland)
    CountryRegion,
    /// County (län)
    County,
    /// Province (landskap)
    Province,
    /// Municipality (kommun)
    Municipality,
    /// Parish (socken)
    Parish,
    /// Swedish economic zone, optionally buffered before indexing
    EconomicZone,
}

impl AreaCategory {
    /// Get all categories that are indexed for spatial lookup
    pub fn all() -> &'static [AreaCategory] {
        &[
            AreaCategory::Atlas5x5,
            AreaCategory::Atlas10x10,
            AreaCategory::CountryRegion,
            AreaCategory::County,
            AreaCategory::Province,
            AreaCategory::Municipality,
            AreaCategory::Parish,
            AreaCategory::EconomicZone,
        ]
    }
}

impl fmt::Display for AreaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AreaCategory::Atlas5x5 => "Atlas5x5",
            AreaCategory::Atlas10x10 => "Atlas10x10",
            AreaCategory::CountryRegion => "CountryRegion",
            AreaCategory::County => "County",
            AreaCategory::Province => "Province",
            AreaCategory::Municipality => "Municipality",
            AreaCategory::Parish => "Parish",
            AreaCategory::EconomicZone => "EconomicZone",
        };
        f.write_str(name)
    }
}

/// Error returned when a category name is not one of the indexed layers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown area category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for AreaCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AreaCategory::all()
            .iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Identity of one area polygon
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Stable key within the category
    pub feature_id: String,

    /// Display label, never an empty string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub category: AreaCategory,
}

impl Area {
    pub fn new(
        category: AreaCategory,
        feature_id: impl Into<String>,
        name: Option<String>,
    ) -> Self {
        Self {
            feature_id: feature_id.into(),
            name: normalize_name(name),
            category,
        }
    }

    /// Re-apply name normalization, for areas built field by field.
    pub fn normalized(mut self) -> Self {
        self.name = normalize_name(self.name.take());
        self
    }
}

/// Empty and whitespace-only names become `None` so that grouping treats
/// "no name" uniformly.
pub fn normalize_name(name: Option<String>) -> Option<String> {
    name.filter(|n| !n.trim().is_empty())
}
