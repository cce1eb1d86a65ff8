//! Caller records that receive enrichment.

use geo::Point;
use serde::{Deserialize, Serialize};

use super::{Area, LocationEnrichment};

/// Location part of an observation record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// WGS84 decimal longitude
    pub decimal_longitude: Option<f64>,

    /// WGS84 decimal latitude
    pub decimal_latitude: Option<f64>,

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

    pub is_in_economic_zone: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub province_part_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_part_id: Option<String>,
}

impl Location {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            decimal_longitude: Some(longitude),
            decimal_latitude: Some(latitude),
            ..Default::default()
        }
    }

    /// Coordinate to enrich, or `None` when missing or the `(0, 0)` sentinel
    pub fn coordinate(&self) -> Option<(f64, f64)> {
        let lon = self.decimal_longitude?;
        let lat = self.decimal_latitude?;
        if lon == 0.0 && lat == 0.0 {
            return None;
        }
        Some((lon, lat))
    }

    /// Overwrite all area fields with an enrichment result
    pub fn apply(&mut self, enrichment: LocationEnrichment) {
        let areas = enrichment.areas;
        self.atlas5x5 = areas.atlas5x5;
        self.atlas10x10 = areas.atlas10x10;
        self.country_region = areas.country_region;
        self.county = areas.county;
        self.province = areas.province;
        self.municipality = areas.municipality;
        self.parish = areas.parish;
        self.is_in_economic_zone = areas.in_economic_zone;
        self.province_part_id = enrichment.province_part_id;
        self.county_part_id = enrichment.county_part_id;
    }
}

/// A site whose county and province were resolved elsewhere
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,

    /// Point geometry in WGS84
    #[serde(skip)]
    pub point: Option<Point<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<Area>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<Area>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub province_part_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_part_id: Option<String>,
}
