use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::route::{DiveRoute, PopularRoute};

/// Identifies one cached route list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Routes of one dive site.
    SiteRoutes { dive_site_id: i64 },
    /// The popular-routes ranking for a given `limit`.
    Popular { limit: u32 },
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped by an explicit invalidation.
    pub invalidations: u64,
    /// Entries dropped because they outlived the TTL.
    pub expirations: u64,
    /// Fetch results refused because their key was invalidated mid-fetch.
    pub stale_writes: u64,
}

/// Snapshot of a key's invalidation state, taken before a fetch starts.
///
/// A store only lands if the key was not invalidated since the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    epoch: u64,
    key: u64,
}

#[derive(Debug)]
struct CachedList<V> {
    value: V,
    fetched_at: Instant,
}

#[derive(Debug)]
struct Shelf<K, V> {
    entries: HashMap<K, CachedList<V>>,
    /// Bumped when the whole shelf is cleared.
    epoch: u64,
    /// Bumped per key by targeted invalidation. Reset together with `epoch`.
    key_generations: HashMap<K, u64>,
}

impl<K: Eq + Hash + Copy, V: Clone> Shelf<K, V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            epoch: 0,
            key_generations: HashMap::new(),
        }
    }

    fn generation(&self, key: &K) -> Generation {
        Generation {
            epoch: self.epoch,
            key: self.key_generations.get(key).copied().unwrap_or(0),
        }
    }

    /// Fresh value for `key`. A stale entry is removed and reported as expired.
    fn get(&mut self, key: K, ttl: Duration, stats: &mut CacheStats) -> Option<V> {
        let stale = match self.entries.get(&key) {
            Some(entry) => entry.fetched_at.elapsed() >= ttl,
            None => {
                stats.misses += 1;
                return None;
            }
        };

        if stale {
            self.entries.remove(&key);
            stats.expirations += 1;
            stats.misses += 1;
            return None;
        }

        stats.hits += 1;
        self.entries.get(&key).map(|entry| entry.value.clone())
    }

    /// Store `value` unless `key` was invalidated after `seen` was taken.
    fn put(&mut self, key: K, value: V, seen: Generation) -> bool {
        if self.generation(&key) != seen {
            return false;
        }
        self.entries.insert(
            key,
            CachedList {
                value,
                fetched_at: Instant::now(),
            },
        );
        true
    }

    fn is_fresh(&self, key: &K, ttl: Duration) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.fetched_at.elapsed() < ttl)
            .unwrap_or(false)
    }

    fn find_key(&self, mut predicate: impl FnMut(&V) -> bool) -> Option<K> {
        self.entries
            .iter()
            .find(|(_, entry)| predicate(&entry.value))
            .map(|(key, _)| *key)
    }

    /// Drop `key` and fence off any fetch for it already in flight.
    fn remove(&mut self, key: &K) -> bool {
        *self.key_generations.entry(*key).or_insert(0) += 1;
        self.entries.remove(key).is_some()
    }

    fn clear(&mut self) -> usize {
        self.epoch += 1;
        self.key_generations.clear();
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }
}

#[derive(Debug)]
struct Inner {
    site_routes: Shelf<i64, Vec<DiveRoute>>,
    popular: Shelf<u32, Vec<PopularRoute>>,
    stats: CacheStats,
}

/// Route lists fetched from the API, keyed by dive site and by popular-query limit.
///
/// Entries go stale after the TTL and are dropped explicitly after every
/// successful mutation; the next read refetches. A fetch that overlaps an
/// invalidation of its key is not stored, see [`Generation`].
#[derive(Debug)]
pub struct RouteCache {
    ttl: Duration,
    inner: RwLock<Inner>,
}

impl RouteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(Inner {
                site_routes: Shelf::new(),
                popular: Shelf::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached routes for a dive site, if present and fresh.
    pub async fn site_routes(&self, dive_site_id: i64) -> Option<Vec<DiveRoute>> {
        let mut inner = self.inner.write().await;
        let Inner {
            site_routes, stats, ..
        } = &mut *inner;
        let cached = site_routes.get(dive_site_id, self.ttl, stats);
        debug!(dive_site_id, hit = cached.is_some(), "site routes cache lookup");
        cached
    }

    /// Take before fetching a site's routes; pass to [`Self::store_site_routes`].
    pub async fn site_generation(&self, dive_site_id: i64) -> Generation {
        self.inner.read().await.site_routes.generation(&dive_site_id)
    }

    /// Store a fetched site list. Returns `false` if the site was invalidated
    /// since `generation` was taken, in which case nothing is stored.
    pub async fn store_site_routes(
        &self,
        dive_site_id: i64,
        routes: Vec<DiveRoute>,
        generation: Generation,
    ) -> bool {
        let mut inner = self.inner.write().await;
        let stored = inner.site_routes.put(dive_site_id, routes, generation);
        if !stored {
            inner.stats.stale_writes += 1;
            debug!(dive_site_id, "discarded site routes fetched across an invalidation");
        }
        stored
    }

    /// Cached popular ranking for `limit`, if present and fresh.
    pub async fn popular(&self, limit: u32) -> Option<Vec<PopularRoute>> {
        let mut inner = self.inner.write().await;
        let Inner { popular, stats, .. } = &mut *inner;
        let cached = popular.get(limit, self.ttl, stats);
        debug!(limit, hit = cached.is_some(), "popular routes cache lookup");
        cached
    }

    pub async fn popular_generation(&self, limit: u32) -> Generation {
        self.inner.read().await.popular.generation(&limit)
    }

    pub async fn store_popular(
        &self,
        limit: u32,
        routes: Vec<PopularRoute>,
        generation: Generation,
    ) -> bool {
        let mut inner = self.inner.write().await;
        let stored = inner.popular.put(limit, routes, generation);
        if !stored {
            inner.stats.stale_writes += 1;
            debug!(limit, "discarded popular routes fetched across an invalidation");
        }
        stored
    }

    /// Dive site whose cached list holds `route_id`, if any.
    pub async fn site_containing(&self, route_id: i64) -> Option<i64> {
        self.inner
            .read()
            .await
            .site_routes
            .find_key(|routes| routes.iter().any(|r| r.id == route_id))
    }

    /// Whether a fresh entry exists for `key`. Does not touch the statistics.
    pub async fn contains(&self, key: CacheKey) -> bool {
        let inner = self.inner.read().await;
        match key {
            CacheKey::SiteRoutes { dive_site_id } => inner.site_routes.is_fresh(&dive_site_id, self.ttl),
            CacheKey::Popular { limit } => inner.popular.is_fresh(&limit, self.ttl),
        }
    }

    /// Drop a single entry. Returns `true` if one was present.
    pub async fn invalidate(&self, key: CacheKey) -> bool {
        let mut inner = self.inner.write().await;
        let removed = match key {
            CacheKey::SiteRoutes { dive_site_id } => inner.site_routes.remove(&dive_site_id),
            CacheKey::Popular { limit } => inner.popular.remove(&limit),
        };
        if removed {
            inner.stats.invalidations += 1;
        }
        removed
    }

    /// Drop the route list of one dive site.
    pub async fn invalidate_site(&self, dive_site_id: i64) -> bool {
        self.invalidate(CacheKey::SiteRoutes { dive_site_id }).await
    }

    /// Drop every popular ranking, whatever its limit.
    pub async fn invalidate_popular(&self) -> usize {
        let mut inner = self.inner.write().await;
        let removed = inner.popular.clear();
        inner.stats.invalidations += removed as u64;
        removed
    }

    /// Drop everything a mutation on a route of `dive_site_id` can affect:
    /// that site's list and all aggregate views.
    pub async fn invalidate_for_mutation(&self, dive_site_id: i64) {
        let site = self.invalidate_site(dive_site_id).await;
        let popular = self.invalidate_popular().await;
        info!(
            dive_site_id,
            site_entry_dropped = site,
            popular_entries_dropped = popular,
            "route cache invalidated after mutation"
        );
    }

    pub async fn invalidate_all(&self) {
        let mut inner = self.inner.write().await;
        let removed = inner.site_routes.clear() + inner.popular.clear();
        inner.stats.invalidations += removed as u64;
        info!(removed, "route cache cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats
    }
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
