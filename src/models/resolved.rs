//! Result of resolving one coordinate against the area layers.

use serde::{Deserialize, Serialize};

use super::{Area, AreaCategory};

/// Areas containing a coordinate, one slot per single-valued category.
///
/// An absent slot means no polygon of that category covers the point, which
/// is a normal outcome for coordinates outside the catalog's coverage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAreaSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atlas5x5: Option<Area>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub atlas10x10: Option<Area>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_region: Option<Area>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<Area>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<Area>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<Area>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parish: Option<Area>,

    pub in_economic_zone: bool,
}

impl ResolvedAreaSet {
    /// Set the area for a single-valued category, returning the area it replaced.
    ///
    /// Economic zone areas only raise the membership flag.
    pub fn set(&mut self, area: Area) -> Option<Area> {
        let slot = match area.category {
            AreaCategory::Atlas5x5 => &mut self.atlas5x5,
            AreaCategory::Atlas10x10 => &mut self.atlas10x10,
            AreaCategory::CountryRegion => &mut self.country_region,
            AreaCategory::County => &mut self.county,
            AreaCategory::Province => &mut self.province,
            AreaCategory::Municipality => &mut self.municipality,
            AreaCategory::Parish => &mut self.parish,
            AreaCategory::EconomicZone => {
                self.in_economic_zone = true;
                return None;
            }
        };
        slot.replace(area)
    }

    /// Get the area resolved for a category
    pub fn get(&self, category: AreaCategory) -> Option<&Area> {
        match category {
            AreaCategory::Atlas5x5 => self.atlas5x5.as_ref(),
            AreaCategory::Atlas10x10 => self.atlas10x10.as_ref(),
            AreaCategory::CountryRegion => self.country_region.as_ref(),
            AreaCategory::County => self.county.as_ref(),
            AreaCategory::Province => self.province.as_ref(),
            AreaCategory::Municipality => self.municipality.as_ref(),
            AreaCategory::Parish => self.parish.as_ref(),
            AreaCategory::EconomicZone => None,
        }
    }

    /// True when no category resolved and the point is outside the economic zone
    pub fn is_empty(&self) -> bool {
        !self.in_economic_zone
            && AreaCategory::all()
                .iter()
                .all(|category| self.get(*category).is_none())
    }
}

/// A resolved area set together with the derived grouping parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationEnrichment {
    #[serde(flatten)]
    pub areas: ResolvedAreaSet,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub province_part_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_part_id: Option<String>,
}

impl LocationEnrichment {
    pub fn from_areas(areas: ResolvedAreaSet) -> Self {
        let province_id = areas.province.as_ref().map(|a| a.feature_id.as_str());
        let county_id = areas.county.as_ref().map(|a| a.feature_id.as_str());

        let province_part_id = crate::parts::province_part(province_id).map(str::to_string);
        let county_part_id = crate::parts::county_part(county_id, province_id).map(str::to_string);

        Self {
            areas,
            province_part_id,
            county_part_id,
        }
    }
}
