//! Spatial index for fast area lookups.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use geo::{BoundingRect, Contains, MultiPolygon, Point};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::{Area, AreaCategory};

/// One area boundary stored in the R-tree
#[derive(Debug, Clone)]
pub struct IndexedGeometry {
    pub area: Area,
    pub geometry: MultiPolygon<f64>,
    /// Position in catalog order, used to break ties between overlapping areas
    pub seq: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedGeometry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedGeometry {
    /// Wrap an area boundary, or `None` if the geometry is empty
    pub fn new(area: Area, geometry: MultiPolygon<f64>, seq: usize) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        Some(Self {
            area,
            geometry,
            seq,
            envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
        })
    }
}

/// R-tree over all indexed area boundaries
pub struct AreaSpatialIndex {
    tree: RTree<IndexedGeometry>,
    by_category: BTreeMap<AreaCategory, usize>,
    containment_tests: AtomicU64,
}

impl AreaSpatialIndex {
    /// Bulk-load the index from prepared entries
    pub fn build(entries: Vec<IndexedGeometry>) -> Self {
        info!("Building spatial index for {} areas...", entries.len());

        let mut by_category = BTreeMap::new();
        for entry in &entries {
            *by_category.entry(entry.area.category).or_insert(0) += 1;
        }

        let tree = RTree::bulk_load(entries);

        info!("Spatial index built with {} entries", tree.size());
        for (category, count) in &by_category {
            info!("  {}: {} areas", category, count);
        }

        Self {
            tree,
            by_category,
            containment_tests: AtomicU64::new(0),
        }
    }

    /// Find all entries whose boundary contains the point.
    ///
    /// The envelope query rejects most entries; survivors get an exact
    /// point-in-polygon test. Results are in catalog order.
    pub fn lookup(&self, lon: f64, lat: f64) -> Vec<&IndexedGeometry> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        let mut matches: Vec<&IndexedGeometry> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|entry| {
                self.containment_tests.fetch_add(1, Ordering::Relaxed);
                entry.geometry.contains(&point)
            })
            .collect();
        matches.sort_by_key(|entry| entry.seq);
        matches
    }

    /// Number of exact containment tests run so far
    pub fn containment_tests(&self) -> u64 {
        self.containment_tests.load(Ordering::Relaxed)
    }

    /// Number of indexed areas in a category
    pub fn count(&self, category: AreaCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }

    /// Get total number of indexed areas
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
