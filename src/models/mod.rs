//! Core data models for area enrichment.

pub mod area;
pub mod record;
pub mod resolved;

pub use area::{normalize_name, Area, AreaCategory, UnknownCategory};
pub use record::{Location, Site};
pub use resolved::{LocationEnrichment, ResolvedAreaSet};
