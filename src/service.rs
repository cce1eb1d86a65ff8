//! Area enrichment service used by ingestion workers.
//!
//! The spatial index and its lookup cache are bundled into a generation that
//! is built off to the side and published behind a single swappable
//! reference. Every resolution clones the current generation once, so a
//! result is always computed and cached against the same index.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheStats, LookupCache};
use crate::catalog::AreaCatalog;
use crate::config::EnrichmentConfig;
use crate::error::EnrichError;
use crate::models::{Area, AreaCategory, Location, LocationEnrichment, ResolvedAreaSet, Site};
use crate::parts::{county_part, province_part};
use crate::pip::{build_index, BuildStats, PositionResolver};

/// An immutable index together with the cache populated from it
struct Generation {
    id: u64,
    built_at: DateTime<Utc>,
    build_stats: BuildStats,
    resolver: PositionResolver,
    cache: LookupCache,
}

impl Generation {
    /// The first coordinate to miss a key is resolved exactly and its
    /// result is shared by every later coordinate rounding to that key.
    fn resolve(&self, lon: f64, lat: f64) -> Arc<ResolvedAreaSet> {
        self.cache
            .get_or_compute(CacheKey::new(lon, lat), || self.resolver.resolve(lon, lat))
    }
}

/// Counters describing the enricher's current state
#[derive(Debug, Clone, Default)]
pub struct EnricherStats {
    pub initialized: bool,
    /// Sequence number of the published generation (0 when none)
    pub generation: u64,
    pub built_at: Option<DateTime<Utc>>,
    /// Successful builds since construction
    pub builds: u64,
    pub indexed_areas: usize,
    pub skipped_areas: usize,
    pub cache: CacheStats,
    pub containment_tests: u64,
    pub overlap_anomalies: u64,
}

/// Enriches observation locations with the areas containing them
pub struct AreaEnricher<C> {
    catalog: C,
    config: EnrichmentConfig,
    current: RwLock<Option<Arc<Generation>>>,
    build_lock: tokio::sync::Mutex<()>,
    builds: AtomicU64,
}

impl<C: AreaCatalog> AreaEnricher<C> {
    /// Create an uninitialized enricher; call [`initialize`](Self::initialize) before use
    pub fn new(catalog: C, config: EnrichmentConfig) -> Self {
        Self {
            catalog,
            config,
            current: RwLock::new(None),
            build_lock: tokio::sync::Mutex::new(()),
            builds: AtomicU64::new(0),
        }
    }

    /// Build the index and cache unless already initialized.
    ///
    /// Concurrent callers wait for the in-flight build and then return
    /// without building again. On failure nothing is published and the call
    /// can be retried.
    pub async fn initialize(&self) -> Result<(), EnrichError> {
        if self.is_initialized() {
            return Ok(());
        }

        let _guard = self.build_lock.lock().await;
        if self.is_initialized() {
            debug!("Index was built while waiting for the build lock");
            return Ok(());
        }

        self.build_and_publish().await
    }

    /// Build a fresh generation from the catalog and replace the current one.
    ///
    /// The previous generation keeps serving until the new one is published,
    /// and stays in place if the build fails.
    pub async fn rebuild(&self) -> Result<(), EnrichError> {
        let _guard = self.build_lock.lock().await;
        self.build_and_publish().await
    }

    async fn build_and_publish(&self) -> Result<(), EnrichError> {
        let started = Instant::now();
        info!("Building area index...");

        let (index, build_stats) =
            match build_index(&self.catalog, self.config.economic_zone_buffer_km).await {
                Ok(built) => built,
                Err(e) => {
                    warn!("Area index build failed: {}", e);
                    return Err(e);
                }
            };

        let id = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::new(Generation {
            id,
            built_at: Utc::now(),
            build_stats,
            resolver: PositionResolver::new(index),
            cache: LookupCache::new(&self.config.cache),
        });

        *self.current.write() = Some(generation);

        info!(
            "Area index generation {} ready with {} areas in {:.2?}",
            id,
            build_stats.indexed,
            started.elapsed()
        );
        Ok(())
    }

    /// Drop the index and cache; the enricher becomes uninitialized.
    ///
    /// Waits for an in-flight build, so the clear always lands after it.
    pub async fn clear(&self) {
        let _guard = self.build_lock.lock().await;
        if self.current.write().take().is_some() {
            info!("Cleared area index and lookup cache");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.current.read().is_some()
    }

    fn current(&self) -> Option<Arc<Generation>> {
        self.current.read().clone()
    }

    /// Resolve the areas containing a WGS84 coordinate.
    ///
    /// Returns `None` when the enricher is not initialized or the coordinate
    /// is the `(0, 0)` sentinel or not finite.
    pub fn resolve(&self, lon: f64, lat: f64) -> Option<Arc<ResolvedAreaSet>> {
        if !lon.is_finite() || !lat.is_finite() || (lon == 0.0 && lat == 0.0) {
            return None;
        }
        let generation = self.current()?;
        Some(generation.resolve(lon, lat))
    }

    /// Resolve a coordinate and derive the province and county parts
    pub fn enrichment(&self, lon: f64, lat: f64) -> Option<LocationEnrichment> {
        let areas = self.resolve(lon, lat)?;
        Some(LocationEnrichment::from_areas(ResolvedAreaSet::clone(&areas)))
    }

    /// Write the resolved areas onto a location.
    ///
    /// Locations without a usable coordinate are left untouched.
    pub fn enrich_location(&self, location: &mut Location) {
        let Some((lon, lat)) = location.coordinate() else {
            return;
        };
        if let Some(enrichment) = self.enrichment(lon, lat) {
            location.apply(enrichment);
        }
    }

    pub fn enrich_locations(&self, locations: &mut [Location]) {
        for location in locations {
            self.enrich_location(location);
        }
    }

    /// Derive the province and county parts for a site.
    ///
    /// The site's county and province are already resolved; sites without a
    /// point are left untouched.
    pub fn enrich_site(&self, site: &mut Site) {
        if site.point.is_none() {
            return;
        }
        let province = site.province.as_ref().map(|a| a.feature_id.as_str());
        let county = site.county.as_ref().map(|a| a.feature_id.as_str());

        site.province_part_id = province_part(province).map(str::to_string);
        site.county_part_id = county_part(county, province).map(str::to_string);
    }

    /// List the catalog's areas of one category (not cached)
    pub async fn get_areas(&self, category: AreaCategory) -> Result<Vec<Area>, EnrichError> {
        Ok(self.catalog.list_areas(&[category]).await?)
    }

    /// Fetch one area's boundary from the catalog (not cached)
    pub async fn get_geometry(
        &self,
        category: AreaCategory,
        feature_id: &str,
    ) -> Result<Option<MultiPolygon<f64>>, EnrichError> {
        Ok(self.catalog.get_geometry(category, feature_id).await?)
    }

    pub fn stats(&self) -> EnricherStats {
        let builds = self.builds.load(Ordering::SeqCst);
        match self.current() {
            Some(generation) => EnricherStats {
                initialized: true,
                generation: generation.id,
                built_at: Some(generation.built_at),
                builds,
                indexed_areas: generation.resolver.index().len(),
                skipped_areas: generation.build_stats.skipped,
                cache: generation.cache.stats(),
                containment_tests: generation.resolver.index().containment_tests(),
                overlap_anomalies: generation.resolver.overlap_anomalies(),
            },
            None => EnricherStats {
                builds,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::error::CatalogError;
    use crate::parts::{county_ids, province_ids, special_ids};
    use geo::{Point, Rect};
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    /// Catalog wrapper that can fail or stall on demand
    #[derive(Default)]
    struct TestCatalog {
        inner: InMemoryCatalog,
        fail: AtomicBool,
        delay: Option<Duration>,
        list_calls: AtomicUsize,
    }

    impl AreaCatalog for TestCatalog {
        async fn list_areas(
            &self,
            categories: &[AreaCategory],
        ) -> Result<Vec<Area>, CatalogError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(CatalogError::Unavailable("test outage".to_string()));
            }
            self.inner.list_areas(categories).await
        }

        async fn get_geometry(
            &self,
            category: AreaCategory,
            feature_id: &str,
        ) -> Result<Option<MultiPolygon<f64>>, CatalogError> {
            self.inner.get_geometry(category, feature_id).await
        }
    }

    fn square(min: f64, max: f64) -> MultiPolygon<f64> {
        Rect::new((min, min), (max, max)).to_polygon().into()
    }

    fn scenario_catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog.insert(
            Area::new(AreaCategory::County, "C1", Some("County One".into())),
            square(0.0, 2.0),
        );
        catalog.insert(
            Area::new(AreaCategory::Province, "P1", Some("Province One".into())),
            square(0.0, 1.0),
        );
        catalog
    }

    async fn ready(catalog: InMemoryCatalog) -> AreaEnricher<InMemoryCatalog> {
        let enricher = AreaEnricher::new(catalog, EnrichmentConfig::default());
        enricher.initialize().await.unwrap();
        enricher
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let enricher = ready(scenario_catalog()).await;

        let inside_both = enricher.resolve(0.5, 0.5).unwrap();
        assert_eq!(inside_both.county.as_ref().unwrap().feature_id, "C1");
        assert_eq!(inside_both.province.as_ref().unwrap().feature_id, "P1");

        let county_only = enricher.resolve(1.5, 0.5).unwrap();
        assert_eq!(county_only.county.as_ref().unwrap().feature_id, "C1");
        assert!(county_only.province.is_none());

        let outside = enricher.resolve(5.0, 5.0).unwrap();
        assert!(outside.is_empty());
        assert!(!outside.in_economic_zone);
    }

    #[tokio::test]
    async fn test_repeat_resolution_is_served_from_cache() {
        let enricher = ready(scenario_catalog()).await;

        let first = enricher.resolve(0.5, 0.5).unwrap();
        let tests_after_first = enricher.stats().containment_tests;
        assert!(tests_after_first > 0);

        let second = enricher.resolve(0.5, 0.5).unwrap();
        assert_eq!(*first, *second);
        assert_eq!(enricher.stats().containment_tests, tests_after_first);
        assert_eq!(enricher.stats().cache.hits, 1);
    }

    #[tokio::test]
    async fn test_sub_meter_offsets_share_cache_entry() {
        let enricher = ready(scenario_catalog()).await;

        // Province P1 ends at x = 1.0; both points round to (1.0, 0.5)
        let west = enricher.resolve(0.999_998, 0.5).unwrap();
        let east = enricher.resolve(1.000_002, 0.500_001).unwrap();
        assert!(Arc::ptr_eq(&west, &east));
        assert_eq!(enricher.stats().cache.entries, 1);
    }

    fn adjacent_counties() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog.insert(
            Area::new(AreaCategory::County, "west", None),
            Rect::new((0.0, 0.0), (1.0, 2.0)).to_polygon(),
        );
        catalog.insert(
            Area::new(AreaCategory::County, "east", None),
            Rect::new((1.0, 0.0), (2.0, 2.0)).to_polygon(),
        );
        catalog
    }

    #[tokio::test]
    async fn test_points_beside_shared_edge_resolve_to_a_county() {
        // Both points round onto the shared edge at x = 1.0
        let enricher = ready(adjacent_counties()).await;
        let west = enricher.resolve(0.999_998, 0.5).unwrap();
        assert_eq!(west.county.as_ref().unwrap().feature_id, "west");
        let east = enricher.resolve(1.000_002, 0.5).unwrap();
        assert_eq!(east.county.as_ref().unwrap().feature_id, "west");

        let enricher = ready(adjacent_counties()).await;
        let east = enricher.resolve(1.000_002, 0.5).unwrap();
        assert_eq!(east.county.as_ref().unwrap().feature_id, "east");
        assert_eq!(enricher.stats().cache.entries, 1);
    }

    #[tokio::test]
    async fn test_sentinel_and_missing_coordinates_are_skipped() {
        let enricher = ready(scenario_catalog()).await;
        let existing = Area::new(AreaCategory::County, "keep", None);

        let mut sentinel = Location::new(0.0, 0.0);
        sentinel.county = Some(existing.clone());
        enricher.enrich_location(&mut sentinel);
        assert_eq!(sentinel.county, Some(existing.clone()));

        let mut missing = Location {
            decimal_latitude: Some(0.5),
            county: Some(existing.clone()),
            ..Default::default()
        };
        enricher.enrich_location(&mut missing);
        assert_eq!(missing.county, Some(existing));

        assert!(enricher.resolve(0.0, 0.0).is_none());
        assert!(enricher.resolve(f64::NAN, 0.5).is_none());

        let stats = enricher.stats();
        assert_eq!(stats.containment_tests, 0);
        assert_eq!(stats.cache.entries, 0);
    }

    #[tokio::test]
    async fn test_enrich_location_writes_areas_and_parts() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(
            Area::new(AreaCategory::County, county_ids::KALMAR, Some("Kalmar".into())),
            Rect::new((15.5, 56.2), (17.2, 58.0)).to_polygon(),
        );
        catalog.insert(
            Area::new(AreaCategory::Province, province_ids::OLAND, Some("Öland".into())),
            Rect::new((16.3, 56.2), (17.2, 57.4)).to_polygon(),
        );
        catalog.insert(
            Area::new(AreaCategory::EconomicZone, "ez", Some(String::new())),
            Rect::new((10.0, 55.0), (25.0, 70.0)).to_polygon(),
        );
        let enricher = ready(catalog).await;

        let mut locations = vec![
            Location::new(16.6, 56.8),
            Location::new(15.9, 57.5),
            Location::new(5.0, 5.0),
        ];
        enricher.enrich_locations(&mut locations);

        let on_oland = &locations[0];
        assert_eq!(on_oland.county_part_id.as_deref(), Some(special_ids::OLAND));
        assert_eq!(on_oland.province_part_id.as_deref(), Some(province_ids::OLAND));
        assert!(on_oland.is_in_economic_zone);

        let mainland = &locations[1];
        assert_eq!(
            mainland.county_part_id.as_deref(),
            Some(special_ids::KALMAR_MAINLAND)
        );
        assert!(mainland.province.is_none());
        assert!(mainland.province_part_id.is_none());

        let abroad = &locations[2];
        assert!(abroad.county.is_none());
        assert!(!abroad.is_in_economic_zone);
    }

    #[tokio::test]
    async fn test_enrich_site_derives_parts_only() {
        let enricher = AreaEnricher::new(InMemoryCatalog::new(), EnrichmentConfig::default());

        let mut site = Site {
            id: "s1".to_string(),
            point: Some(Point::new(20.0, 67.0)),
            county: Some(Area::new(AreaCategory::County, county_ids::NORRBOTTEN, None)),
            province: Some(Area::new(AreaCategory::Province, province_ids::LULE_LAPPMARK, None)),
            ..Default::default()
        };
        enricher.enrich_site(&mut site);
        assert_eq!(site.province_part_id.as_deref(), Some(special_ids::LAPPLAND));
        assert_eq!(site.county_part_id.as_deref(), Some(county_ids::NORRBOTTEN));

        let mut no_point = Site {
            county: Some(Area::new(AreaCategory::County, county_ids::KALMAR, None)),
            ..Default::default()
        };
        enricher.enrich_site(&mut no_point);
        assert!(no_point.county_part_id.is_none());
    }

    #[tokio::test]
    async fn test_uninitialized_enricher_leaves_locations_untouched() {
        let enricher = AreaEnricher::new(scenario_catalog(), EnrichmentConfig::default());
        assert!(!enricher.is_initialized());

        let mut location = Location::new(0.5, 0.5);
        enricher.enrich_location(&mut location);
        assert!(location.county.is_none());
    }

    #[tokio::test]
    async fn test_clear_resets_state() {
        let enricher = ready(scenario_catalog()).await;
        enricher.resolve(0.5, 0.5);
        enricher.clear().await;

        assert!(!enricher.is_initialized());
        assert!(enricher.resolve(0.5, 0.5).is_none());
        assert_eq!(enricher.stats().cache.entries, 0);

        enricher.initialize().await.unwrap();
        assert_eq!(enricher.stats().generation, 2);
        assert_eq!(enricher.stats().cache.entries, 0);
    }

    #[tokio::test]
    async fn test_clear_waits_for_in_flight_build() {
        let catalog = TestCatalog {
            inner: scenario_catalog(),
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let enricher = AreaEnricher::new(catalog, EnrichmentConfig::default());

        let (built, ()) = tokio::join!(enricher.initialize(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            enricher.clear().await;
        });
        built.unwrap();

        assert_eq!(enricher.stats().builds, 1);
        assert!(!enricher.is_initialized());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let enricher = ready(scenario_catalog()).await;
        enricher.initialize().await.unwrap();
        enricher.initialize().await.unwrap();
        assert_eq!(enricher.stats().builds, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_initialize_builds_once() {
        let catalog = TestCatalog {
            inner: scenario_catalog(),
            delay: Some(Duration::from_millis(10)),
            ..Default::default()
        };
        let enricher = Arc::new(AreaEnricher::new(catalog, EnrichmentConfig::default()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let enricher = Arc::clone(&enricher);
                tokio::spawn(async move {
                    enricher.initialize().await.unwrap();
                    enricher.is_initialized()
                })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            assert!(result.unwrap());
        }
        assert_eq!(enricher.stats().builds, 1);
        assert_eq!(
            enricher.catalog.list_calls.load(Ordering::SeqCst),
            AreaCategory::all().len()
        );
    }

    #[tokio::test]
    async fn test_failed_first_build_stays_uninitialized() {
        let catalog = TestCatalog {
            inner: scenario_catalog(),
            fail: AtomicBool::new(true),
            ..Default::default()
        };
        let enricher = AreaEnricher::new(catalog, EnrichmentConfig::default());

        let err = enricher.initialize().await.unwrap_err();
        assert!(matches!(err, EnrichError::Catalog(CatalogError::Unavailable(_))));
        assert!(!enricher.is_initialized());

        enricher.catalog.fail.store(false, Ordering::SeqCst);
        enricher.initialize().await.unwrap();
        assert!(enricher.is_initialized());
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_generation() {
        let catalog = TestCatalog {
            inner: scenario_catalog(),
            ..Default::default()
        };
        let enricher = AreaEnricher::new(catalog, EnrichmentConfig::default());
        enricher.initialize().await.unwrap();

        enricher.catalog.fail.store(true, Ordering::SeqCst);
        assert!(enricher.rebuild().await.is_err());

        assert_eq!(enricher.stats().generation, 1);
        let areas = enricher.resolve(0.5, 0.5).unwrap();
        assert_eq!(areas.county.as_ref().unwrap().feature_id, "C1");
    }

    #[tokio::test]
    async fn test_rebuild_replaces_index_and_cache() {
        let catalog = scenario_catalog();
        let handle = catalog.clone();
        let enricher = ready(catalog).await;
        assert_eq!(
            enricher.resolve(0.5, 0.5).unwrap().county.as_ref().unwrap().feature_id,
            "C1"
        );

        handle.replace(vec![(
            Area::new(AreaCategory::County, "C2", None),
            square(0.0, 2.0),
        )]);
        enricher.rebuild().await.unwrap();

        let stats = enricher.stats();
        assert_eq!(stats.generation, 2);
        assert_eq!(stats.cache.entries, 0);

        let areas = enricher.resolve(0.5, 0.5).unwrap();
        assert_eq!(areas.county.as_ref().unwrap().feature_id, "C2");
        assert!(areas.province.is_none());
    }

    #[tokio::test]
    async fn test_pass_through_reads() {
        let enricher = AreaEnricher::new(scenario_catalog(), EnrichmentConfig::default());

        let counties = enricher.get_areas(AreaCategory::County).await.unwrap();
        assert_eq!(counties.len(), 1);
        assert_eq!(counties[0].name.as_deref(), Some("County One"));

        let geometry = enricher.get_geometry(AreaCategory::Province, "P1").await.unwrap();
        assert!(geometry.is_some());
        assert!(!enricher.is_initialized());
    }
}
