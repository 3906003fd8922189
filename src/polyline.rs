//! Decoded route geometry.
//!
//! Directions services return GeoJSON `[lng, lat]` pairs; they are flipped to
//! [`Coordinate`] at the boundary so the rest of the crate only sees
//! latitude-first points.

use serde::{Deserialize, Serialize};

use crate::haversine::path_km;
use crate::model::Coordinate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Builds a polyline from GeoJSON-ordered `[lng, lat]` pairs.
    pub fn from_lng_lat(pairs: &[[f64; 2]]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|[lng, lat]| Coordinate::new(*lat, *lng))
                .collect(),
        )
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Great-circle length along the geometry.
    pub fn length_km(&self) -> f64 {
        path_km(&self.points)
    }
}
