//! 2-opt local search over the open path depot → stops.
//!
//! # Algorithm
//!
//! The depot acts as a virtual predecessor of index 0 and the path has no
//! successor after the last stop (a zero-cost edge). For every pair
//! `i < k`, reversing `order[i..=k]` swaps edges `(i-1, i), (k, k+1)` for
//! `(i-1, k), (i, k+1)`. A reversal is applied when it is cheaper by more
//! than [`IMPROVEMENT_EPSILON`]; full passes repeat until one makes no
//! change. The closing leg back to the depot is not part of the objective.

use crate::error::ProviderError;
use crate::model::{CandidatePoint, Coordinate};
use crate::traits::{leg_km, DistanceProvider, Id};

/// Minimum gain for a reversal; keeps floating-point ties from cycling.
pub const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Runs 2-opt to a local optimum.
pub fn improve<I, P>(
    depot: Coordinate,
    order: Vec<CandidatePoint<I>>,
    provider: &P,
) -> Result<Vec<CandidatePoint<I>>, ProviderError>
where
    I: Id,
    P: DistanceProvider + ?Sized,
{
    improve_with_passes(depot, order, provider, usize::MAX)
}

/// As [`improve`], stopping after `max_passes` full scans.
///
/// The cap only matters for providers whose distances are not a metric
/// (asymmetric road times, say), where a reversal can change the cost of the
/// edges inside the segment.
pub fn improve_with_passes<I, P>(
    depot: Coordinate,
    mut order: Vec<CandidatePoint<I>>,
    provider: &P,
    max_passes: usize,
) -> Result<Vec<CandidatePoint<I>>, ProviderError>
where
    I: Id,
    P: DistanceProvider + ?Sized,
{
    let n = order.len();
    if n < 2 {
        return Ok(order);
    }

    let mut passes = 0;
    let mut improved = true;
    while improved && passes < max_passes {
        improved = false;
        passes += 1;

        for i in 0..n - 1 {
            for k in i + 1..n {
                let before = edge_km(depot, &order, i as isize - 1, i, provider)?
                    + edge_km(depot, &order, k as isize, k + 1, provider)?;
                let after = edge_km(depot, &order, i as isize - 1, k, provider)?
                    + edge_km(depot, &order, i as isize, k + 1, provider)?;

                if after + IMPROVEMENT_EPSILON < before {
                    order[i..=k].reverse();
                    improved = true;
                }
            }
        }
    }

    if improved {
        tracing::debug!(passes, "2-opt stopped at pass cap");
    } else {
        tracing::trace!(passes, "2-opt reached local optimum");
    }
    Ok(order)
}

/// Cost of the edge between positions `from` and `to`. Position -1 is the
/// depot; a position past the end yields a zero-cost edge.
fn edge_km<I, P>(
    depot: Coordinate,
    order: &[CandidatePoint<I>],
    from: isize,
    to: usize,
    provider: &P,
) -> Result<f64, ProviderError>
where
    P: DistanceProvider + ?Sized,
{
    let Some(to) = order.get(to) else {
        return Ok(0.0);
    };
    let from = if from < 0 {
        depot
    } else {
        order[from as usize].location
    };
    leg_km(provider, from, to.location)
}

/// Length of depot → order[0] → … → order[last], without the closing leg.
pub fn open_path_km<I, P>(
    depot: Coordinate,
    order: &[CandidatePoint<I>],
    provider: &P,
) -> Result<f64, ProviderError>
where
    P: DistanceProvider + ?Sized,
{
    let mut total = 0.0;
    let mut current = depot;
    for point in order {
        total += leg_km(provider, current, point.location)?;
        current = point.location;
    }
    Ok(total)
}
