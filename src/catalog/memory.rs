//! In-memory catalog, shared between clones.

use std::sync::Arc;

use geo::MultiPolygon;
use parking_lot::RwLock;

use super::AreaCatalog;
use crate::error::CatalogError;
use crate::models::{Area, AreaCategory};

#[derive(Debug, Clone)]
struct CatalogEntry {
    area: Area,
    geometry: Option<MultiPolygon<f64>>,
}

/// Catalog held in memory.
///
/// Clones share the same contents, so a caller can keep a handle and swap
/// the areas out while an enricher reads from another clone.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: Arc<RwLock<Vec<CatalogEntry>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an area with its boundary
    pub fn insert(&self, area: Area, geometry: impl Into<MultiPolygon<f64>>) {
        self.entries.write().push(CatalogEntry {
            area: area.normalized(),
            geometry: Some(geometry.into()),
        });
    }

    /// Add an area that has no geometry
    pub fn insert_without_geometry(&self, area: Area) {
        self.entries.write().push(CatalogEntry {
            area: area.normalized(),
            geometry: None,
        });
    }

    /// Replace the whole catalog
    pub fn replace(&self, areas: Vec<(Area, MultiPolygon<f64>)>) {
        let entries = areas
            .into_iter()
            .map(|(area, geometry)| CatalogEntry {
                area: area.normalized(),
                geometry: Some(geometry),
            })
            .collect();
        *self.entries.write() = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl AreaCatalog for InMemoryCatalog {
    async fn list_areas(&self, categories: &[AreaCategory]) -> Result<Vec<Area>, CatalogError> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|e| categories.contains(&e.area.category))
            .map(|e| e.area.clone())
            .collect())
    }

    async fn get_geometry(
        &self,
        category: AreaCategory,
        feature_id: &str,
    ) -> Result<Option<MultiPolygon<f64>>, CatalogError> {
        Ok(self
            .entries
            .read()
            .iter()
            .find(|e| e.area.category == category && e.area.feature_id == feature_id)
            .and_then(|e| e.geometry.clone()))
    }
}
