//! Core traits for the tour planner.
//!
//! Providers are composed as decorators: an external adapter at the bottom,
//! retry and caching layers on top. Distances and geocoding share the same
//! decorator types.

use std::hash::Hash;
use std::sync::Arc;

use crate::error::ProviderError;
use crate::haversine::haversine_km;
use crate::model::Coordinate;

/// Unique identifier for candidate points.
pub trait Id: Clone + Eq + Hash {}

impl<T> Id for T where T: Clone + Eq + Hash {}

/// Source of travel distances between coordinates.
///
/// `Ok(None)` means the provider has no answer; callers fall back to
/// great-circle distance. `Err` is a genuine failure and is never
/// equivalent to "unavailable".
pub trait DistanceProvider: Send + Sync {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> Result<Option<f64>, ProviderError>;

    fn total_route_distance_km(&self, path: &[Coordinate]) -> Result<Option<f64>, ProviderError>;
}

impl<P: DistanceProvider + ?Sized> DistanceProvider for &P {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> Result<Option<f64>, ProviderError> {
        (**self).distance_km(from, to)
    }

    fn total_route_distance_km(&self, path: &[Coordinate]) -> Result<Option<f64>, ProviderError> {
        (**self).total_route_distance_km(path)
    }
}

impl<P: DistanceProvider + ?Sized> DistanceProvider for Box<P> {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> Result<Option<f64>, ProviderError> {
        (**self).distance_km(from, to)
    }

    fn total_route_distance_km(&self, path: &[Coordinate]) -> Result<Option<f64>, ProviderError> {
        (**self).total_route_distance_km(path)
    }
}

impl<P: DistanceProvider + ?Sized> DistanceProvider for Arc<P> {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> Result<Option<f64>, ProviderError> {
        (**self).distance_km(from, to)
    }

    fn total_route_distance_km(&self, path: &[Coordinate]) -> Result<Option<f64>, ProviderError> {
        (**self).total_route_distance_km(path)
    }
}

/// Forward geocoding of free-form addresses.
pub trait Geocode: Send + Sync {
    fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError>;
}

impl<G: Geocode + ?Sized> Geocode for &G {
    fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError> {
        (**self).geocode(address)
    }
}

impl<G: Geocode + ?Sized> Geocode for Arc<G> {
    fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError> {
        (**self).geocode(address)
    }
}

/// Provider used when no mapping integration is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

impl DistanceProvider for NullProvider {
    fn distance_km(&self, _from: Coordinate, _to: Coordinate) -> Result<Option<f64>, ProviderError> {
        Ok(None)
    }

    fn total_route_distance_km(&self, _path: &[Coordinate]) -> Result<Option<f64>, ProviderError> {
        Ok(None)
    }
}

/// Distance from the provider, or great-circle distance when it has no answer.
pub fn leg_km<P>(provider: &P, from: Coordinate, to: Coordinate) -> Result<f64, ProviderError>
where
    P: DistanceProvider + ?Sized,
{
    Ok(provider
        .distance_km(from, to)?
        .unwrap_or_else(|| haversine_km(from, to)))
}
