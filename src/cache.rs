//! Memoizing decorator over any [`DistanceProvider`] or [`Geocode`].
//!
//! Results are keyed by a fingerprint of the operation name and its
//! arguments. Only successful answers (including "unavailable") are
//! stored; errors always reach the caller and are retried next time.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::error::ProviderError;
use crate::model::Coordinate;
use crate::traits::{DistanceProvider, Geocode};

/// Default number of fingerprints kept before the oldest is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cached {
    Distance(Option<f64>),
    Location(Coordinate),
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, Cached>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

/// Caching provider with bounded FIFO eviction.
#[derive(Debug)]
pub struct CachingProvider<P> {
    inner: P,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl<P> CachingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// A capacity of zero disables caching entirely.
    pub fn with_capacity(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // A panic while holding the lock cannot leave the map half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cached<T, F>(
        &self,
        key: String,
        fetch: F,
        into_entry: fn(T) -> Cached,
        from_entry: fn(Cached) -> Option<T>,
    ) -> Result<T, ProviderError>
    where
        T: Copy,
        F: FnOnce() -> Result<T, ProviderError>,
    {
        let hit = self.lock().entries.get(&key).copied().and_then(from_entry);
        if let Some(value) = hit {
            tracing::debug!(fingerprint = %key, "provider cache hit");
            return Ok(value);
        }

        // The lock is not held across the delegate call; concurrent misses on
        // the same key both fetch and the later insert wins.
        let value = fetch()?;
        self.store(key, into_entry(value));
        Ok(value)
    }

    fn cached_distance<F>(&self, key: String, fetch: F) -> Result<Option<f64>, ProviderError>
    where
        F: FnOnce() -> Result<Option<f64>, ProviderError>,
    {
        self.cached(key, fetch, Cached::Distance, |cached| match cached {
            Cached::Distance(value) => Some(value),
            Cached::Location(_) => None,
        })
    }

    fn store(&self, key: String, value: Cached) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.lock();
        if state.entries.insert(key.clone(), value).is_some() {
            return;
        }
        state.order.push_back(key);
        while state.order.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
            }
        }
    }
}

/// Deterministic cache key for an operation over `points`.
pub fn fingerprint(operation: &str, points: &[Coordinate]) -> String {
    let args = points
        .iter()
        .map(Coordinate::key)
        .collect::<Vec<_>>()
        .join(";");
    format!("{}:{}", operation, args)
}

impl<P: DistanceProvider> DistanceProvider for CachingProvider<P> {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> Result<Option<f64>, ProviderError> {
        let key = fingerprint("distance_km", &[from, to]);
        self.cached_distance(key, || self.inner.distance_km(from, to))
    }

    fn total_route_distance_km(&self, path: &[Coordinate]) -> Result<Option<f64>, ProviderError> {
        let key = fingerprint("total_route_distance_km", path);
        self.cached_distance(key, || self.inner.total_route_distance_km(path))
    }
}

impl<P: Geocode> Geocode for CachingProvider<P> {
    fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError> {
        let address = address.trim();
        let key = format!("geocode:{}", address);
        self.cached(key, || self.inner.geocode(address), Cached::Location, |cached| match cached {
            Cached::Location(location) => Some(location),
            Cached::Distance(_) => None,
        })
    }
}
