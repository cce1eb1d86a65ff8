//! Point-in-Polygon (PIP) area lookup.
//!
//! Loads area boundaries from the catalog into an R-tree and resolves
//! coordinates to the areas containing them.

mod buffer;
mod builder;
mod index;
mod resolver;

pub use buffer::buffer_km;
pub use builder::{build_index, BuildStats};
pub use index::{AreaSpatialIndex, IndexedGeometry};
pub use resolver::PositionResolver;
