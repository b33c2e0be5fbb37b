//! Pluggable travel-time oracles, shared distance/time cache.
//!
//! The solver depends on the [`TimeOracle`] trait rather than a concrete
//! implementation: a zero-dependency default (haversine-over-ground-speed)
//! plus an optional HTTP-backed implementation (behind the `osrm` feature),
//! both wrapped in the same LRU cache.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::geo::{self, LatLon};

/// Default travel-time cache capacity (§5: "default ~100k pairs").
pub const DEFAULT_CACHE_CAPACITY: usize = 100_000;

/// Computes travel time in minutes between two points.
///
/// Implementations must be deterministic for a fixed input (fast mode's
/// bit-determinism, §8, depends on it) and safe to call concurrently.
pub trait TimeOracle: Send + Sync {
    fn travel_minutes(&self, from: LatLon, to: LatLon) -> f64;
}

/// Straight-line distance divided by an assumed average ground speed.
/// Zero external dependencies; always available.
#[derive(Debug, Default, Clone, Copy)]
pub struct HaversineOracle;

impl TimeOracle for HaversineOracle {
    fn travel_minutes(&self, from: LatLon, to: LatLon) -> f64 {
        geo::travel_minutes(from, to)
    }
}

/// Calls an external routing matrix service (e.g. OSRM) for road-network
/// travel time. Falls back to [`HaversineOracle`] on any request failure so a
/// transient outage degrades the estimate rather than failing the plan.
#[cfg(feature = "osrm")]
pub struct OsrmOracle {
    client: reqwest::blocking::Client,
    endpoint: String,
}

#[cfg(feature = "osrm")]
impl OsrmOracle {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn query(&self, from: LatLon, to: LatLon) -> Option<f64> {
        #[derive(serde::Deserialize)]
        struct Response {
            code: String,
            routes: Option<Vec<Route>>,
        }
        #[derive(serde::Deserialize)]
        struct Route {
            duration: f64,
        }

        let url = format!(
            "{}/route/v1/driving/{},{};{},{}?overview=false",
            self.endpoint, from.1, from.0, to.1, to.0
        );
        let resp: Response = self.client.get(&url).send().ok()?.json().ok()?;
        if resp.code != "Ok" {
            return None;
        }
        Some(resp.routes?.into_iter().next()?.duration / 60.0)
    }
}

#[cfg(feature = "osrm")]
impl TimeOracle for OsrmOracle {
    fn travel_minutes(&self, from: LatLon, to: LatLon) -> f64 {
        self.query(from, to)
            .unwrap_or_else(|| HaversineOracle.travel_minutes(from, to))
    }
}

fn location_key(p: LatLon) -> (i64, i64) {
    // 6 decimal places (~0.1m) is far finer than any planning-relevant distance.
    ((p.0 * 1e6).round() as i64, (p.1 * 1e6).round() as i64)
}

type LocationPairKey = ((i64, i64), (i64, i64));

/// LRU-cached wrapper around any [`TimeOracle`]. Cache key is the unordered
/// pair of quantized coordinates, so `(a, b)` and `(b, a)` share an entry.
pub struct CachedTimeOracle<O: TimeOracle> {
    inner: O,
    cache: Mutex<LruCache<LocationPairKey, f64>>,
}

impl<O: TimeOracle> CachedTimeOracle<O> {
    pub fn new(inner: O, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).expect("capacity must be > 0"),
            )),
        }
    }

    pub fn with_default_capacity(inner: O) -> Self {
        Self::new(inner, DEFAULT_CACHE_CAPACITY)
    }
}

impl<O: TimeOracle> TimeOracle for CachedTimeOracle<O> {
    fn travel_minutes(&self, from: LatLon, to: LatLon) -> f64 {
        let (ka, kb) = (location_key(from), location_key(to));
        let key = if ka <= kb { (ka, kb) } else { (kb, ka) };

        {
            let mut cache = self.cache.lock().unwrap();
            if let Some(&minutes) = cache.get(&key) {
                return minutes;
            }
        }

        let minutes = self.inner.travel_minutes(from, to);

        let mut cache = self.cache.lock().unwrap();
        cache.put(key, minutes);
        minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_oracle_is_symmetric() {
        let oracle = HaversineOracle;
        let a = (30.4515, -91.1871);
        let b = (35.2271, -80.8431);
        assert!(
            (oracle.travel_minutes(a, b) - oracle.travel_minutes(b, a)).abs() < 1e-9
        );
    }

    #[test]
    fn cache_returns_same_value_on_hit() {
        let oracle = CachedTimeOracle::new(HaversineOracle, 16);
        let a = (30.4515, -91.1871);
        let b = (35.2271, -80.8431);
        let first = oracle.travel_minutes(a, b);
        let second = oracle.travel_minutes(a, b);
        assert_eq!(first, second);
    }

    #[test]
    fn cache_is_keyed_on_unordered_pair() {
        let oracle = CachedTimeOracle::new(HaversineOracle, 16);
        let a = (30.4515, -91.1871);
        let b = (35.2271, -80.8431);
        let forward = oracle.travel_minutes(a, b);
        let backward = oracle.travel_minutes(b, a);
        assert_eq!(forward, backward);
        assert_eq!(oracle.cache.lock().unwrap().len(), 1);
    }

    #[test]
    fn cache_evicts_least_recently_used() {
        let oracle = CachedTimeOracle::new(HaversineOracle, 1);
        let a = (30.0, -90.0);
        let b = (31.0, -90.0);
        let c = (32.0, -90.0);
        oracle.travel_minutes(a, b);
        oracle.travel_minutes(a, c);
        assert_eq!(oracle.cache.lock().unwrap().len(), 1);
    }
}
