//! Area catalog providers.
//!
//! The catalog owns the area polygons; the enrichment engine only reads it
//! when building its spatial index and for pass-through lookups.

mod file;
mod memory;

use std::future::Future;
use std::sync::Arc;

use geo::MultiPolygon;

pub use file::JsonCatalog;
pub use memory::InMemoryCatalog;

use crate::error::CatalogError;
use crate::models::{Area, AreaCategory};

/// Source of named areas and their boundaries.
pub trait AreaCatalog: Send + Sync {
    /// List all areas belonging to any of the given categories.
    fn list_areas(
        &self,
        categories: &[AreaCategory],
    ) -> impl Future<Output = Result<Vec<Area>, CatalogError>> + Send;

    /// Get the boundary of one area, or `None` if the area has no geometry.
    fn get_geometry(
        &self,
        category: AreaCategory,
        feature_id: &str,
    ) -> impl Future<Output = Result<Option<MultiPolygon<f64>>, CatalogError>> + Send;
}

impl<T: AreaCatalog> AreaCatalog for Arc<T> {
    fn list_areas(
        &self,
        categories: &[AreaCategory],
    ) -> impl Future<Output = Result<Vec<Area>, CatalogError>> + Send {
        (**self).list_areas(categories)
    }

    fn get_geometry(
        &self,
        category: AreaCategory,
        feature_id: &str,
    ) -> impl Future<Output = Result<Option<MultiPolygon<f64>>, CatalogError>> + Send {
        (**self).get_geometry(category, feature_id)
    }
}
