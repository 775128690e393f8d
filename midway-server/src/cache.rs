//! Caching layer for geocoding results.
//!
//! The same handful of addresses (home, office, a favourite mall) come up
//! again and again, and their coordinates don't change. Routes and nearby
//! searches pass straight through.

use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::{CandidateStation, Location, Route};
use crate::provider::{MapProvider, ProviderError};

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
            ttl: Duration::from_secs(10 * 60),
            max_capacity: 1000,
        }
    }
}

/// Map provider with a geocode cache.
///
/// Only successful lookups are cached, keyed by the trimmed address.
pub struct CachedMapProvider<P> {
    inner: P,
    geocodes: MokaCache<String, Location>,
}

impl<P: MapProvider> CachedMapProvider<P> {
    /// Create a new cached provider.
    pub fn new(inner: P, config: &CacheConfig) -> Self {
        let geocodes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, geocodes }
    }

    /// Access the underlying provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of cached geocodes. Moka applies writes lazily, so this can
    /// lag behind recent lookups.
    pub fn cache_entry_count(&self) -> u64 {
        self.geocodes.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.geocodes.invalidate_all();
    }
}

impl<P: MapProvider> MapProvider for CachedMapProvider<P> {
    async fn geocode(&self, address: &str) -> Result<Location, ProviderError> {
        let key = address.trim();
        if let Some(cached) = self.geocodes.get(key).await {
            return Ok(cached);
        }

        let location = self.inner.geocode(key).await?;
        self.geocodes
            .insert(key.to_string(), location.clone())
            .await;
        Ok(location)
    }

    async fn transit_route(
        &self,
        origin: &Location,
        destination: &Location,
    ) -> Result<Route, ProviderError> {
        self.inner.transit_route(origin, destination).await
    }

    async fn nearby_stations(
        &self,
        center: &Location,
        radius_m: u32,
    ) -> Result<Vec<CandidateStation>, ProviderError> {
        self.inner.nearby_stations(center, radius_m).await
    }

    async fn locate_station(
        &self,
        name: &str,
        near: &Location,
    ) -> Result<Option<Location>, ProviderError> {
        self.inner.locate_station(name, near).await
    }
}
