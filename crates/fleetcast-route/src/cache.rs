//! TTL cache of live routes.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use fleetcast_core::{GeoPoint, RoutePath};
use tracing::trace;

/// Kind of geometry a route follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMode {
    Road,
    Rail,
}

impl RouteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Road => "road",
            Self::Rail => "rail",
        }
    }
}

/// Cache key: mode, center rounded to ~1 m and requested size in meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    mode: RouteMode,
    lat_e5: i64,
    lng_e5: i64,
    size_m: u64,
}

impl CacheKey {
    pub fn new(mode: RouteMode, center: GeoPoint, size_m: f64) -> Self {
        Self {
            mode,
            lat_e5: (center.lat * 1e5).round() as i64,
            lng_e5: (center.lng * 1e5).round() as i64,
            size_m: size_m.round() as u64,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    path: RoutePath,
    inserted_at: Instant,
}

/// Concurrent route cache shared by all simulations.
///
/// Only live paths are stored; synthetic fallbacks are refused so an
/// outage is retried on the next request.
pub struct RouteCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl RouteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Get a fresh path, evicting the entry if it has expired.
    pub fn get(&self, key: &CacheKey) -> Option<RoutePath> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.path.clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
        None
    }

    /// Store a live path. Returns false for synthetic paths, which are not cached.
    ///
    /// Expired entries under other keys are purged first, so the map only
    /// grows with live entries.
    pub fn insert(&self, key: CacheKey, path: RoutePath) -> bool {
        if path.is_synthetic() {
            return false;
        }
        let purged = self.purge_expired();
        if purged > 0 {
            trace!(purged, "Purged expired routes");
        }
        self.entries.insert(
            key,
            CacheEntry {
                path,
                inserted_at: Instant::now(),
            },
        );
        true
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_path() -> RoutePath {
        RoutePath::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.001, 0.0)]).unwrap()
    }

    #[test]
    fn test_get_returns_inserted_path() {
        let cache = RouteCache::new(Duration::from_secs(60));
        let key = CacheKey::new(RouteMode::Road, GeoPoint::new(36.8, 10.18), 800.0);
        assert!(cache.insert(key, live_path()));
        assert_eq!(cache.get(&key), Some(live_path()));
    }

    #[test]
    fn test_key_distinguishes_mode_and_size() {
        let center = GeoPoint::new(36.8, 10.18);
        let cache = RouteCache::new(Duration::from_secs(60));
        cache.insert(CacheKey::new(RouteMode::Road, center, 800.0), live_path());
        assert!(cache.get(&CacheKey::new(RouteMode::Rail, center, 800.0)).is_none());
        assert!(cache.get(&CacheKey::new(RouteMode::Road, center, 900.0)).is_none());
    }

    #[test]
    fn test_synthetic_path_not_cached() {
        let cache = RouteCache::new(Duration::from_secs(60));
        let key = CacheKey::new(RouteMode::Rail, GeoPoint::new(1.0, 1.0), 4000.0);
        let synthetic =
            RoutePath::synthetic(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.01, 0.0)]).unwrap();
        assert!(!cache.insert(key, synthetic));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entry_evicted() {
        let cache = RouteCache::new(Duration::ZERO);
        let key = CacheKey::new(RouteMode::Road, GeoPoint::new(0.0, 0.0), 100.0);
        cache.insert(key, live_path());
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let cache = RouteCache::new(Duration::ZERO);
        cache.insert(CacheKey::new(RouteMode::Road, GeoPoint::new(0.0, 0.0), 1.0), live_path());
        cache.insert(CacheKey::new(RouteMode::Rail, GeoPoint::new(0.0, 0.0), 1.0), live_path());
        assert_eq!(cache.purge_expired(), 2);
    }

    #[test]
    fn test_insert_purges_expired_keys() {
        let cache = RouteCache::new(Duration::ZERO);
        for i in 0..500 {
            let center = GeoPoint::new(36.0 + f64::from(i) * 0.001, 10.0);
            cache.insert(CacheKey::new(RouteMode::Road, center, 800.0), live_path());
        }
        // Only the entry inserted last survives until the next insert
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_keeps_fresh_keys() {
        let cache = RouteCache::new(Duration::from_secs(60));
        for i in 0..3 {
            let center = GeoPoint::new(f64::from(i), 0.0);
            cache.insert(CacheKey::new(RouteMode::Rail, center, 4000.0), live_path());
        }
        assert_eq!(cache.len(), 3);
    }
}
