//! Alvar - area enrichment for biodiversity observations
//!
//! Resolves observation coordinates to the counties, provinces, municipalities,
//! parishes, atlas grid cells and economic zone that contain them, using an
//! R-tree over the area catalog and a coordinate-keyed lookup cache.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod parts;
pub mod pip;
pub mod service;

pub use catalog::{AreaCatalog, InMemoryCatalog, JsonCatalog};
pub use config::EnrichmentConfig;
pub use error::{CatalogError, EnrichError};
pub use models::{Area, AreaCategory, Location, LocationEnrichment, ResolvedAreaSet, Site};
pub use service::{AreaEnricher, EnricherStats};
