//! Great-circle distance (fallback when no road distance is available).
//!
//! Ignores roads but is always available.

use crate::error::ProviderError;
use crate::model::Coordinate;
use crate::traits::DistanceProvider;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometers.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Sum of haversine legs along `path`.
pub fn path_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|leg| haversine_km(leg[0], leg[1])).sum()
}

/// Provider that always answers with great-circle distance.
///
/// Planning through this provider is the "GeoDistance-only" mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineProvider;

impl DistanceProvider for HaversineProvider {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> Result<Option<f64>, ProviderError> {
        Ok(Some(haversine_km(from, to)))
    }

    fn total_route_distance_km(&self, path: &[Coordinate]) -> Result<Option<f64>, ProviderError> {
        Ok(Some(path_km(path)))
    }
}
