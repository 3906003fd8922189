//! Route planning: construction, improvement and distance totaling.

use rayon::prelude::*;

use crate::construct::construct;
use crate::error::PlanError;
use crate::haversine::HaversineProvider;
use crate::improve::improve_with_passes;
use crate::model::{CandidatePoint, Coordinate, RoutePlan, Stop};
use crate::traits::{leg_km, DistanceProvider, Id};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Cap on stops; the greedy walk stops once it is reached.
    pub max_stops: Option<usize>,
    /// Cap on full 2-opt passes. `None` runs to a local optimum; set a cap
    /// for non-metric providers.
    pub max_improvement_passes: Option<usize>,
}

impl PlanOptions {
    pub fn with_max_stops(max_stops: usize) -> Self {
        Self {
            max_stops: Some(max_stops),
            ..Self::default()
        }
    }
}

/// One independent planning request, e.g. one per account.
#[derive(Debug, Clone)]
pub struct PlanRequest<I> {
    pub depot: Coordinate,
    pub candidates: Vec<CandidatePoint<I>>,
    pub options: PlanOptions,
}

/// Plans a single tour with `provider`.
pub fn plan<I, P>(
    provider: &P,
    depot: Coordinate,
    candidates: &[CandidatePoint<I>],
    options: &PlanOptions,
) -> Result<RoutePlan<I>, PlanError>
where
    I: Id,
    P: DistanceProvider + ?Sized,
{
    depot.validate("depot")?;
    if candidates.is_empty() {
        return Err(PlanError::NoCandidates);
    }
    for (index, candidate) in candidates.iter().enumerate() {
        candidate
            .location
            .validate(format!("candidate {} ({})", index, candidate.label))?;
    }

    let order = construct(depot, candidates, provider, options.max_stops)?;
    let passes = options.max_improvement_passes.unwrap_or(usize::MAX);
    let order = improve_with_passes(depot, order, provider, passes)?;

    let mut stops = Vec::with_capacity(order.len());
    let mut legs_km = 0.0;
    let mut current = depot;
    for (order_index, point) in order.into_iter().enumerate() {
        let distance_from_prev_km = leg_km(provider, current, point.location)?;
        legs_km += distance_from_prev_km;
        current = point.location;
        stops.push(Stop {
            point,
            order_index,
            distance_from_prev_km,
        });
    }

    let return_leg_km = if stops.is_empty() {
        0.0
    } else {
        leg_km(provider, current, depot)?
    };
    let road_distance_km = road_distance(provider, depot, &stops);
    let total_distance_km = legs_km + return_leg_km;

    tracing::info!(
        candidates = candidates.len(),
        stops = stops.len(),
        total_distance_km,
        "planned collection tour"
    );

    Ok(RoutePlan {
        depot,
        stops,
        total_distance_km,
        return_leg_km,
        road_distance_km,
        stop_cap: options.max_stops,
    })
}

/// Provider-reported length of the closed tour, if it has one.
///
/// The legs already determine the plan, so a failure here (waypoint limits,
/// say) only drops the figure.
fn road_distance<I, P>(provider: &P, depot: Coordinate, stops: &[Stop<I>]) -> Option<f64>
where
    P: DistanceProvider + ?Sized,
{
    if stops.is_empty() {
        return None;
    }
    let mut path = Vec::with_capacity(stops.len() + 2);
    path.push(depot);
    path.extend(stops.iter().map(|stop| stop.point.location));
    path.push(depot);
    match provider.total_route_distance_km(&path) {
        Ok(distance) => distance,
        Err(err) => {
            tracing::warn!(points = path.len(), error = %err, "closed tour distance unavailable");
            None
        }
    }
}

/// Planner bound to a composed distance provider.
#[derive(Debug, Clone)]
pub struct RoutePlanner<P> {
    provider: P,
}

impl<P: DistanceProvider> RoutePlanner<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn plan<I: Id>(
        &self,
        depot: Coordinate,
        candidates: &[CandidatePoint<I>],
        options: &PlanOptions,
    ) -> Result<RoutePlan<I>, PlanError> {
        plan(&self.provider, depot, candidates, options)
    }

    /// Plans with the configured provider and, if it fails, re-plans using
    /// great-circle distances only.
    pub fn plan_or_fallback<I: Id>(
        &self,
        depot: Coordinate,
        candidates: &[CandidatePoint<I>],
        options: &PlanOptions,
    ) -> Result<RoutePlan<I>, PlanError> {
        match self.plan(depot, candidates, options) {
            Err(PlanError::Provider(err)) => {
                tracing::warn!(error = %err, "distance provider failed, re-planning with great-circle distances");
                plan(&HaversineProvider, depot, candidates, options)
            }
            other => other,
        }
    }

    /// Plans independent requests in parallel. Results are in request order.
    pub fn plan_batch<I>(&self, requests: &[PlanRequest<I>]) -> Vec<Result<RoutePlan<I>, PlanError>>
    where
        I: Id + Send + Sync,
    {
        requests
            .par_iter()
            .map(|request| self.plan(request.depot, &request.candidates, &request.options))
            .collect()
    }
}
