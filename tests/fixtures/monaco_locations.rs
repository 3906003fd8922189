//! Monaco locations used as depot and bin sites.
//!
//! Coordinates from OpenStreetMap. All are reachable on the Monaco road
//! network, so they route with an OSRM Monaco dataset.

#![allow(dead_code)]

use tour_planner::{CandidatePoint, Coordinate};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Collection depot near the Fontvieille heliport.
pub const DEPOT: Location = Location::new("Fontvieille Depot", 43.7260, 7.4196);

pub const BIN_SITES: &[Location] = &[
    Location::new("Casino Square", 43.7396, 7.4281),
    Location::new("Prince's Palace", 43.7314, 7.4200),
    Location::new("Oceanographic Museum", 43.7307, 7.4253),
    Location::new("Stade Louis II", 43.7276, 7.4155),
    Location::new("Port Hercule", 43.7347, 7.4227),
    Location::new("Larvotto Beach", 43.7446, 7.4358),
    Location::new("Monaco Station", 43.7388, 7.4204),
    Location::new("Jardin Exotique", 43.7311, 7.4131),
    Location::new("Grimaldi Forum", 43.7437, 7.4317),
];

/// Every bin site as a candidate, ids "bin-0", "bin-1", ...
pub fn bin_candidates() -> Vec<CandidatePoint<String>> {
    BIN_SITES
        .iter()
        .enumerate()
        .map(|(index, site)| CandidatePoint::new(format!("bin-{}", index), site.name, site.coordinate()))
        .collect()
}
