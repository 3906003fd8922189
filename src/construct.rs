//! Greedy nearest-neighbor tour construction.
//!
//! Starting at the depot, repeatedly visit the closest unvisited candidate.
//! Ties go to the candidate that appears first in the remaining pool, so the
//! result is fully determined by the input order. O(n²) distance lookups.

use crate::error::ProviderError;
use crate::model::{CandidatePoint, Coordinate};
use crate::traits::{leg_km, DistanceProvider, Id};

/// Builds an initial visiting order.
///
/// Stops when every candidate is placed or `max_stops` is reached; the cap
/// limits the greedy walk rather than pre-selecting a subset.
pub fn construct<I, P>(
    depot: Coordinate,
    candidates: &[CandidatePoint<I>],
    provider: &P,
    max_stops: Option<usize>,
) -> Result<Vec<CandidatePoint<I>>, ProviderError>
where
    I: Id,
    P: DistanceProvider + ?Sized,
{
    let limit = max_stops.map_or(candidates.len(), |cap| cap.min(candidates.len()));
    let mut pool: Vec<&CandidatePoint<I>> = candidates.iter().collect();
    let mut ordered = Vec::with_capacity(limit);
    let mut current = depot;

    while ordered.len() < limit {
        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;

        for (index, candidate) in pool.iter().enumerate() {
            let distance = leg_km(provider, current, candidate.location)?;
            if distance < best_distance {
                best_distance = distance;
                best_index = index;
            }
        }

        let next = pool.remove(best_index);
        tracing::trace!(order = ordered.len(), label = %next.label, distance_km = best_distance, "nearest stop");
        current = next.location;
        ordered.push(next.clone());
    }

    Ok(ordered)
}
