//! tour-planner
//!
//! Single-vehicle collection tour planning: nearest-neighbor construction,
//! 2-opt improvement and pluggable distance providers.

pub mod error;
pub mod model;
pub mod traits;
pub mod haversine;
pub mod cache;
pub mod retry;
pub mod osrm;
pub mod osrm_data;
pub mod geocode;
pub mod polyline;
pub mod construct;
pub mod improve;
pub mod planner;
pub mod selection;
pub mod config;

pub use error::{PlanError, ProviderError};
pub use model::{CandidatePoint, Coordinate, RoutePlan, Stop};
pub use planner::{PlanOptions, RoutePlanner};
pub use traits::{DistanceProvider, Geocode};
