//! Value types flowing through the planner.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::traits::Id;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]. NaN fails.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Checks the range, naming `subject` in the error.
    pub fn validate(&self, subject: impl Into<String>) -> Result<(), PlanError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(PlanError::InvalidCoordinate {
                subject: subject.into(),
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// Exact textual key, also used in cache fingerprints. Float `Display`
    /// round-trips, so distinct coordinates never share a key.
    pub fn key(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// A pickup point eligible for the tour, supplied by the bin lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePoint<I> {
    pub id: I,
    pub label: String,
    pub location: Coordinate,
}

impl<I: Id> CandidatePoint<I> {
    pub fn new(id: I, label: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id,
            label: label.into(),
            location,
        }
    }
}

/// One visited point in a finished plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop<I> {
    pub point: CandidatePoint<I>,
    pub order_index: usize,
    pub distance_from_prev_km: f64,
}

/// Result of one planning invocation. Re-planning produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan<I> {
    pub depot: Coordinate,
    pub stops: Vec<Stop<I>>,
    /// Sum of leg distances plus the closing leg back to the depot.
    pub total_distance_km: f64,
    /// Distance from the last stop back to the depot.
    pub return_leg_km: f64,
    /// Road distance of the closed tour, when the provider reports one.
    pub road_distance_km: Option<f64>,
    pub stop_cap: Option<usize>,
}

impl<I> RoutePlan<I> {
    pub fn stop_ids(&self) -> Vec<&I> {
        self.stops.iter().map(|stop| &stop.point.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
