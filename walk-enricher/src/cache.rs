//! Caching layer for routing queries.
//!
//! Address tables often hold several rows at one coordinate (flats in a
//! block, units in an office). Their candidate stops are identical, so the
//! walking routes are too. Caching by exact origin coordinate and stop id
//! saves those repeat calls against a rate-limited API.
//!
//! Only successful routes are cached; a failed query is retried the next
//! time the same pair comes up.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::{Address, Stop, StopId, WalkingRoute};
use crate::enrich::RoutingService;

/// Cache key: (origin latitude bits, origin longitude bits, stop).
type RouteKey = (u64, u64, StopId);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_capacity: 10_000,
        }
    }
}

/// Routing service with caching.
///
/// Wraps any `RoutingService` and answers repeated (origin, stop) pairs
/// from memory.
pub struct CachedRoutingService<S> {
    inner: S,
    routes: MokaCache<RouteKey, WalkingRoute>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: RoutingService> CachedRoutingService<S> {
    /// Create a new cached service.
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner,
            routes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn key(origin: &Address, destination: &Stop) -> RouteKey {
        let (lat, lon) = origin.location.to_bits();
        (lat, lon, destination.id)
    }

    /// Number of queries answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of queries forwarded to the wrapped service.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.routes.invalidate_all();
    }
}

impl<S: RoutingService> RoutingService for CachedRoutingService<S> {
    type Error = S::Error;

    async fn walking_route(
        &self,
        origin: &Address,
        destination: &Stop,
    ) -> Result<WalkingRoute, S::Error> {
        let key = Self::key(origin, destination);

        // Try cache first
        if let Some(route) = self.routes.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(route);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let route = self.inner.walking_route(origin, destination).await?;
        self.routes.insert(key, route).await;

        Ok(route)
    }
}
