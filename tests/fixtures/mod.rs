//! Test fixtures for tour-planner.
//!
//! Real Monaco locations (small Geofabrik extract, fast to preprocess for
//! OSRM) and helpers to turn them into candidate points.

pub mod monaco_locations;

pub use monaco_locations::*;
