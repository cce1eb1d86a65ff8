//! Coordinate-keyed lookup cache.
//!
//! Keys are coordinates rounded to five decimals (about one meter), so
//! near-duplicate coordinates share one entry. The cache is split into
//! stripes selected by hashing the key; each stripe has its own entry map and
//! its own compute lock, so misses on the same key are computed once while
//! misses on unrelated keys rarely contend.
//!
//! Without a capacity the cache grows until the owning generation is
//! dropped. With a capacity the stripes split it between them, never more
//! stripes than entries, and each stripe evicts its least recently used
//! entry once its share is full.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use xxhash_rust::xxh64::xxh64;

use crate::config::CacheConfig;
use crate::models::ResolvedAreaSet;

const KEY_SCALE: f64 = 1e5;

/// Coordinate rounded to five decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lon_e5: i64,
    lat_e5: i64,
}

impl CacheKey {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon_e5: (lon * KEY_SCALE).round() as i64,
            lat_e5: (lat * KEY_SCALE).round() as i64,
        }
    }

    /// Rounded longitude
    pub fn longitude(&self) -> f64 {
        self.lon_e5 as f64 / KEY_SCALE
    }

    /// Rounded latitude
    pub fn latitude(&self) -> f64 {
        self.lat_e5 as f64 / KEY_SCALE
    }

    fn stripe_hash(&self) -> u64 {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&self.lon_e5.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.lat_e5.to_le_bytes());
        xxh64(&bytes, 0)
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Slot {
    value: Arc<ResolvedAreaSet>,
    last_used: u64,
}

#[derive(Default)]
struct StripeEntries {
    map: HashMap<CacheKey, Slot>,
    /// Access tick → key, only maintained when the cache is bounded
    recency: BTreeMap<u64, CacheKey>,
    tick: u64,
}

impl StripeEntries {
    fn get(&mut self, key: &CacheKey, track_recency: bool) -> Option<Arc<ResolvedAreaSet>> {
        let slot = self.map.get_mut(key)?;
        if track_recency {
            self.tick += 1;
            self.recency.remove(&slot.last_used);
            self.recency.insert(self.tick, *key);
            slot.last_used = self.tick;
        }
        Some(Arc::clone(&slot.value))
    }

    /// Insert unless the key is already present; returns the stored value
    /// and the number of evicted entries.
    fn insert_if_absent(
        &mut self,
        key: CacheKey,
        value: Arc<ResolvedAreaSet>,
        capacity: Option<usize>,
    ) -> (Arc<ResolvedAreaSet>, u64) {
        if let Some(existing) = self.map.get(&key) {
            return (Arc::clone(&existing.value), 0);
        }

        let mut evicted = 0;
        if let Some(capacity) = capacity {
            while self.map.len() >= capacity {
                let Some((_, oldest)) = self.recency.pop_first() else {
                    break;
                };
                self.map.remove(&oldest);
                evicted += 1;
            }
            self.tick += 1;
            self.recency.insert(self.tick, key);
        }

        self.map.insert(
            key,
            Slot {
                value: Arc::clone(&value),
                last_used: self.tick,
            },
        );
        (value, evicted)
    }
}

struct Stripe {
    entries: Mutex<StripeEntries>,
    compute: Mutex<()>,
    capacity: Option<usize>,
}

impl Stripe {
    fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: Mutex::new(StripeEntries::default()),
            compute: Mutex::new(()),
            capacity,
        }
    }
}

/// Striped compute-once cache from coordinate to resolved areas
pub struct LookupCache {
    stripes: Vec<Stripe>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl LookupCache {
    pub fn new(config: &CacheConfig) -> Self {
        let stripes = match config.capacity {
            None => (0..config.stripes.max(1)).map(|_| Stripe::new(None)).collect(),
            Some(capacity) => {
                let capacity = capacity.max(1);
                let count = config.stripes.clamp(1, capacity);
                let (share, remainder) = (capacity / count, capacity % count);
                (0..count)
                    .map(|i| Stripe::new(Some(share + usize::from(i < remainder))))
                    .collect()
            }
        };

        Self {
            stripes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Unbounded cache with default striping
    pub fn unbounded() -> Self {
        Self::new(&CacheConfig::default())
    }

    fn stripe(&self, key: &CacheKey) -> &Stripe {
        let idx = (key.stripe_hash() % self.stripes.len() as u64) as usize;
        &self.stripes[idx]
    }

    /// Get the cached value for a key, if present
    pub fn get(&self, key: &CacheKey) -> Option<Arc<ResolvedAreaSet>> {
        let stripe = self.stripe(key);
        let value = stripe.entries.lock().get(key, stripe.capacity.is_some());
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Return the cached value or compute and store it.
    ///
    /// Concurrent misses on one key serialize on the stripe's compute lock;
    /// the waiter re-checks and reuses the first result, so `compute` runs
    /// once per key while the entry stays cached.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Arc<ResolvedAreaSet>
    where
        F: FnOnce() -> ResolvedAreaSet,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }

        let stripe = self.stripe(&key);
        let _compute_guard = stripe.compute.lock();

        if let Some(value) = self.get(&key) {
            return value;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(compute());

        let (value, evicted) = stripe
            .entries
            .lock()
            .insert_if_absent(key, value, stripe.capacity);
        if evicted > 0 {
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
        }
        value
    }

    /// Number of cached coordinates
    pub fn len(&self) -> usize {
        self.stripes.iter().map(|s| s.entries.lock().map.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
