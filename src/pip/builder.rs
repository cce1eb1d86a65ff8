//! Builds the spatial index from an area catalog.

use geo::{CoordsIter, MultiPolygon};
use tracing::{debug, info, warn};

use super::{buffer_km, AreaSpatialIndex, IndexedGeometry};
use crate::catalog::AreaCatalog;
use crate::error::EnrichError;
use crate::models::AreaCategory;

/// Counts from one index build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub indexed: usize,
    pub skipped: usize,
}

/// Fetch every indexed category from the catalog and bulk-load an index.
///
/// Catalog failures and non-finite coordinates abort the build. Entries
/// without usable geometry, or returned under the wrong category, are
/// skipped.
pub async fn build_index<C: AreaCatalog>(
    catalog: &C,
    economic_zone_buffer_km: f64,
) -> Result<(AreaSpatialIndex, BuildStats), EnrichError> {
    let mut entries = Vec::new();
    let mut stats = BuildStats::default();

    for &category in AreaCategory::all() {
        let areas = catalog.list_areas(&[category]).await?;
        debug!("Fetched {} {} areas", areas.len(), category);

        for area in areas {
            if area.category != category {
                warn!(
                    "Skipping area {}: listed as {} but requested {}",
                    area.feature_id, area.category, category
                );
                stats.skipped += 1;
                continue;
            }

            let geometry = match catalog.get_geometry(category, &area.feature_id).await? {
                Some(g) => g,
                None => {
                    warn!("Skipping {} area {}: no geometry", category, area.feature_id);
                    stats.skipped += 1;
                    continue;
                }
            };

            if let Some(reason) = invalid_reason(&geometry) {
                return Err(EnrichError::MalformedGeometry {
                    category,
                    feature_id: area.feature_id,
                    reason,
                });
            }

            let geometry = if category == AreaCategory::EconomicZone && economic_zone_buffer_km > 0.0
            {
                debug!(
                    "Buffering economic zone {} by {} km",
                    area.feature_id, economic_zone_buffer_km
                );
                buffer_km(&geometry, economic_zone_buffer_km)
            } else {
                geometry
            };

            let seq = entries.len();
            let feature_id = area.feature_id.clone();
            match IndexedGeometry::new(area.normalized(), geometry, seq) {
                Some(entry) => entries.push(entry),
                None => {
                    warn!("Skipping {} area {}: empty geometry", category, feature_id);
                    stats.skipped += 1;
                }
            }
        }
    }

    stats.indexed = entries.len();
    info!(
        "Prepared {} areas for indexing ({} skipped)",
        stats.indexed, stats.skipped
    );

    Ok((AreaSpatialIndex::build(entries), stats))
}

fn invalid_reason(geometry: &MultiPolygon<f64>) -> Option<String> {
    geometry
        .coords_iter()
        .find(|c| !c.x.is_finite() || !c.y.is_finite())
        .map(|c| format!("non-finite coordinate ({}, {})", c.x, c.y))
}
