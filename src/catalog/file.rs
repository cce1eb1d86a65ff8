//! Catalog loaded from a JSON file.

use std::fs;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use hashbrown::HashMap;
use serde::Deserialize;
use tracing::{info, warn};

use super::AreaCatalog;
use crate::error::CatalogError;
use crate::models::{Area, AreaCategory};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    areas: Vec<RawArea>,
}

/// One catalog entry as stored on disk.
///
/// `coordinates` follows GeoJSON MultiPolygon nesting:
/// polygons → rings (exterior first) → `[lon, lat]` positions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArea {
    feature_id: String,
    #[serde(default)]
    name: Option<String>,
    category: String,
    #[serde(default)]
    coordinates: Option<Vec<Vec<Vec<[f64; 2]>>>>,
}

/// Read-only catalog parsed from a JSON document
#[derive(Debug, Default)]
pub struct JsonCatalog {
    areas: Vec<Area>,
    geometries: HashMap<(AreaCategory, String), MultiPolygon<f64>>,
}

impl JsonCatalog {
    /// Load a catalog file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&content)?;
        info!(
            "Loaded {} areas ({} with geometry) from {}",
            catalog.areas.len(),
            catalog.geometries.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse a catalog document.
    ///
    /// Entries whose category is not an indexed layer are skipped.
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)?;

        let mut catalog = Self::default();
        for raw in file.areas {
            let category = match raw.category.parse::<AreaCategory>() {
                Ok(c) => c,
                Err(e) => {
                    warn!("Skipping catalog entry {}: {}", raw.feature_id, e);
                    continue;
                }
            };

            if let Some(coordinates) = raw.coordinates {
                catalog.geometries.insert(
                    (category, raw.feature_id.clone()),
                    to_multi_polygon(coordinates),
                );
            }
            catalog
                .areas
                .push(Area::new(category, raw.feature_id, raw.name));
        }

        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

fn to_multi_polygon(polygons: Vec<Vec<Vec<[f64; 2]>>>) -> MultiPolygon<f64> {
    let polygons = polygons
        .into_iter()
        .filter_map(|rings| {
            let mut rings = rings.into_iter().map(to_ring);
            let exterior = rings.next()?;
            Some(Polygon::new(exterior, rings.collect()))
        })
        .collect();
    MultiPolygon::new(polygons)
}

fn to_ring(positions: Vec<[f64; 2]>) -> LineString<f64> {
    // Polygon::new closes open rings
    LineString::new(
        positions
            .into_iter()
            .map(|[x, y]| Coord { x, y })
            .collect(),
    )
}

impl AreaCatalog for JsonCatalog {
    async fn list_areas(&self, categories: &[AreaCategory]) -> Result<Vec<Area>, CatalogError> {
        Ok(self
            .areas
            .iter()
            .filter(|a| categories.contains(&a.category))
            .cloned()
            .collect())
    }

    async fn get_geometry(
        &self,
        category: AreaCategory,
        feature_id: &str,
    ) -> Result<Option<MultiPolygon<f64>>, CatalogError> {
        Ok(self
            .geometries
            .get(&(category, feature_id.to_string()))
            .cloned())
    }
}
