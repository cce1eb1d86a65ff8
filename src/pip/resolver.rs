//! Grouping of containment matches into a resolved area set.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::{AreaSpatialIndex, IndexedGeometry};
use crate::models::ResolvedAreaSet;

/// Resolves coordinates against one spatial index
pub struct PositionResolver {
    index: AreaSpatialIndex,
    overlap_anomalies: AtomicU64,
}

impl PositionResolver {
    pub fn new(index: AreaSpatialIndex) -> Self {
        Self {
            index,
            overlap_anomalies: AtomicU64::new(0),
        }
    }

    /// Resolve the areas containing a point
    pub fn resolve(&self, lon: f64, lat: f64) -> ResolvedAreaSet {
        let matches = self.index.lookup(lon, lat);

        debug!(
            "PIP lookup at ({}, {}): {} containing areas",
            lon,
            lat,
            matches.len()
        );

        let (areas, overlaps) = group_matches(&matches, lon, lat);
        if overlaps > 0 {
            self.overlap_anomalies.fetch_add(overlaps, Ordering::Relaxed);
        }
        areas
    }

    /// Number of same-category overlaps seen so far
    pub fn overlap_anomalies(&self) -> u64 {
        self.overlap_anomalies.load(Ordering::Relaxed)
    }

    pub fn index(&self) -> &AreaSpatialIndex {
        &self.index
    }
}

/// Fold matches (in catalog order) into a result set.
///
/// When two areas of a single-valued category both contain the point the
/// later one wins; each such overlap is counted and logged.
fn group_matches(matches: &[&IndexedGeometry], lon: f64, lat: f64) -> (ResolvedAreaSet, u64) {
    let mut areas = ResolvedAreaSet::default();
    let mut overlaps = 0;

    for entry in matches {
        if let Some(previous) = areas.set(entry.area.clone()) {
            overlaps += 1;
            warn!(
                "Overlapping {} areas at ({}, {}): {} replaced by {}",
                entry.area.category, lon, lat, previous.feature_id, entry.area.feature_id
            );
        }
    }

    (areas, overlaps)
}
