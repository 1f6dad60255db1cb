//! Memoization of oracle answers.
//!
//! Keys round every stop to 5 decimal places (about a meter), so requests
//! for practically the same stop list share an entry. Only successful
//! answers are stored.

use std::fmt::Write as _;
use std::time::Duration;

use moka::sync::Cache as MokaCache;
use tracing::debug;

use crate::error::OracleError;
use crate::model::{Coordinate, VehicleType};
use crate::osrm::TravelMode;
use crate::traits::{OracleEstimate, RouteOracle};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an answer stays valid.
    pub ttl: Duration,
    /// Maximum number of cached stop lists.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 10_000,
        }
    }
}

/// Oracle wrapper that answers repeated stop lists from memory.
pub struct CachedOracle<O> {
    inner: O,
    cache: MokaCache<String, OracleEstimate>,
}

impl<O: RouteOracle> CachedOracle<O> {
    pub fn new(inner: O, config: &CacheConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, cache }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

fn cache_key(stops: &[Coordinate], mode: TravelMode) -> String {
    let mut key = format!("{mode:?}");
    for stop in stops {
        let _ = write!(key, "|{:.5},{:.5}", stop.lat, stop.lng);
    }
    key
}

impl<O: RouteOracle> RouteOracle for CachedOracle<O> {
    fn estimate(&self, stops: &[Coordinate], vehicle_type: VehicleType) -> Result<OracleEstimate, OracleError> {
        let key = cache_key(stops, TravelMode::from(vehicle_type));
        if let Some(hit) = self.cache.get(&key) {
            debug!(stops = stops.len(), "route cache hit");
            return Ok(hit);
        }

        let estimate = self.inner.estimate(stops, vehicle_type)?;
        self.cache.insert(key, estimate);
        Ok(estimate)
    }
}
