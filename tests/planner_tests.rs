//! End-to-end planner tests.
//!
//! Exercises the full pipeline (selection, construction, 2-opt, totals)
//! and the provider decorators composed the way a host would compose them.

mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tour_planner::cache::CachingProvider;
use tour_planner::construct::construct;
use tour_planner::haversine::{haversine_km, HaversineProvider};
use tour_planner::improve::{improve, open_path_km};
use tour_planner::planner::{PlanRequest, plan};
use tour_planner::retry::{RetryConfig, RetryingProvider};
use tour_planner::selection::{select_candidates, BinSnapshot, BinStatus, DEFAULT_FILL_THRESHOLD};
use tour_planner::traits::NullProvider;
use tour_planner::{
    CandidatePoint, Coordinate, DistanceProvider, PlanError, PlanOptions, ProviderError, RoutePlanner,
};

use fixtures::{bin_candidates, DEPOT};

// ============================================================================
// Test Providers
// ============================================================================

/// Great-circle distances scaled by 1.3 to mimic road detours, counting calls.
/// The first `failures` calls fail.
#[derive(Default)]
struct MockRoads {
    calls: AtomicUsize,
    failures: usize,
}

impl MockRoads {
    fn failing(failures: usize) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) -> Result<(), ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(ProviderError::Api {
                status: 503,
                message: "unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl DistanceProvider for MockRoads {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> Result<Option<f64>, ProviderError> {
        self.tick()?;
        Ok(Some(haversine_km(from, to) * 1.3))
    }

    fn total_route_distance_km(&self, path: &[Coordinate]) -> Result<Option<f64>, ProviderError> {
        self.tick()?;
        Ok(Some(
            path.windows(2).map(|leg| haversine_km(leg[0], leg[1]) * 1.3).sum(),
        ))
    }
}

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff: Duration::from_millis(1),
    }
}

fn on_equator(id: u32, lng: f64) -> CandidatePoint<u32> {
    CandidatePoint::new(id, format!("bin-{}", id), Coordinate::new(0.0, lng))
}

const ORIGIN: Coordinate = Coordinate::new(0.0, 0.0);

fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut result = Vec::new();
    for index in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(index);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            result.push(tail);
        }
    }
    result
}

// ============================================================================
// Construction and Improvement
// ============================================================================

#[test]
fn nearest_neighbor_visits_closest_first() {
    let candidates = vec![on_equator(1, 1.0), on_equator(2, 2.0), on_equator(5, 5.0)];

    let order = construct(ORIGIN, &candidates, &NullProvider, None).unwrap();
    let ids: Vec<_> = order.iter().map(|point| point.id).collect();
    assert_eq!(ids, vec![1, 2, 5]);

    let capped = construct(ORIGIN, &candidates, &NullProvider, Some(2)).unwrap();
    let ids: Vec<_> = capped.iter().map(|point| point.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn two_opt_never_lengthens_any_permutation() {
    let base: Vec<_> = bin_candidates().into_iter().take(5).collect();
    let depot = DEPOT.coordinate();

    for order in permutations(&base) {
        let before = open_path_km(depot, &order, &NullProvider).unwrap();
        let improved = improve(depot, order.clone(), &NullProvider).unwrap();
        let after = open_path_km(depot, &improved, &NullProvider).unwrap();

        assert!(after <= before + 1e-12, "2-opt lengthened path: {} > {}", after, before);

        let mut before_ids: Vec<_> = order.iter().map(|point| point.id.clone()).collect();
        let mut after_ids: Vec<_> = improved.iter().map(|point| point.id.clone()).collect();
        before_ids.sort();
        after_ids.sort();
        assert_eq!(before_ids, after_ids, "2-opt must only reorder");
    }
}

// ============================================================================
// Planning
// ============================================================================

#[test]
fn single_stop_is_out_and_back() {
    let d = haversine_km(ORIGIN, Coordinate::new(0.0, 1.0));
    let result = plan(&NullProvider, ORIGIN, &[on_equator(1, 1.0)], &PlanOptions::default()).unwrap();

    assert!((result.total_distance_km - 2.0 * d).abs() < 1e-9);
    assert_eq!(result.stops[0].order_index, 0);
    assert!((result.stops[0].distance_from_prev_km - d).abs() < 1e-9);
}

#[test]
fn planning_is_idempotent_without_external_provider() {
    let planner = RoutePlanner::new(NullProvider);
    let candidates = bin_candidates();
    let options = PlanOptions::default();

    let first = planner.plan(DEPOT.coordinate(), &candidates, &options).unwrap();
    let second = planner.plan(DEPOT.coordinate(), &candidates, &options).unwrap();

    assert_eq!(first.stop_ids(), second.stop_ids());
    assert_eq!(first.total_distance_km, second.total_distance_km);
    assert_eq!(first, second);
}

#[test]
fn plan_invariants_hold_for_every_cap() {
    let planner = RoutePlanner::new(NullProvider);
    let candidates = bin_candidates();

    for cap in 0..=candidates.len() + 1 {
        let plan = planner
            .plan(DEPOT.coordinate(), &candidates, &PlanOptions::with_max_stops(cap))
            .unwrap();

        assert_eq!(plan.stops.len(), cap.min(candidates.len()));
        assert_eq!(plan.stop_cap, Some(cap));
        for (position, stop) in plan.stops.iter().enumerate() {
            assert_eq!(stop.order_index, position);
            assert!(stop.distance_from_prev_km >= 0.0);
        }

        let legs: f64 = plan.stops.iter().map(|stop| stop.distance_from_prev_km).sum();
        let closing = plan
            .stops
            .last()
            .map(|stop| haversine_km(stop.point.location, plan.depot))
            .unwrap_or(0.0);
        assert!((plan.total_distance_km - (legs + closing)).abs() < 1e-9);
    }
}

#[test]
fn empty_candidates_is_no_candidates_error() {
    let planner = RoutePlanner::new(NullProvider);
    let candidates: Vec<CandidatePoint<String>> = Vec::new();
    let err = planner
        .plan(DEPOT.coordinate(), &candidates, &PlanOptions::default())
        .unwrap_err();
    assert!(matches!(err, PlanError::NoCandidates));
}

#[test]
fn invalid_candidate_coordinate_is_rejected() {
    let planner = RoutePlanner::new(NullProvider);
    let mut candidates = bin_candidates();
    candidates[3].location = Coordinate::new(43.7, 190.0);

    let err = planner
        .plan(DEPOT.coordinate(), &candidates, &PlanOptions::default())
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidCoordinate { .. }));
}

#[test]
fn selected_bins_feed_the_planner() {
    let bins: Vec<BinSnapshot<String>> = bin_candidates()
        .into_iter()
        .enumerate()
        .map(|(index, point)| BinSnapshot {
            id: point.id,
            label: point.label,
            location: point.location,
            fill_pct: (index * 12) as f64,
            status: if index == 0 {
                BinStatus::NeedsPickup
            } else {
                BinStatus::Normal
            },
        })
        .collect();

    let selection = select_candidates(&bins, DEFAULT_FILL_THRESHOLD).unwrap();
    // bin-0 flagged; bin-7 (84%) and bin-8 (96%) over threshold.
    let mut ids: Vec<_> = selection.candidates.iter().map(|c| c.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["bin-0", "bin-7", "bin-8"]);
    assert_eq!(selection.notices.len(), 2);

    let plan = RoutePlanner::new(NullProvider)
        .plan(DEPOT.coordinate(), &selection.candidates, &PlanOptions::default())
        .unwrap();
    assert_eq!(plan.stops.len(), 3);
}

// ============================================================================
// Provider Decorators
// ============================================================================

#[test]
fn cached_stack_serves_replans_without_provider_calls() {
    let roads = Arc::new(MockRoads::default());
    let stack = CachingProvider::new(RetryingProvider::new(Arc::clone(&roads), fast_retry(2)));
    let planner = RoutePlanner::new(stack);
    let candidates = bin_candidates();

    let first = planner
        .plan(DEPOT.coordinate(), &candidates, &PlanOptions::default())
        .unwrap();
    let calls_after_first = roads.calls();
    assert!(calls_after_first > 0);

    let second = planner
        .plan(DEPOT.coordinate(), &candidates, &PlanOptions::default())
        .unwrap();
    assert_eq!(roads.calls(), calls_after_first, "replan should be fully cached");
    assert_eq!(first, second);

    let road = first.road_distance_km.unwrap();
    assert!((road - first.total_distance_km).abs() < 1e-9);
}

#[test]
fn provider_distances_drive_the_plan() {
    let roads = MockRoads::default();
    let scaled = plan(&roads, ORIGIN, &[on_equator(1, 1.0)], &PlanOptions::default()).unwrap();
    let plain = plan(&NullProvider, ORIGIN, &[on_equator(1, 1.0)], &PlanOptions::default()).unwrap();
    assert!((scaled.total_distance_km - plain.total_distance_km * 1.3).abs() < 1e-9);
}

#[test]
fn retry_recovers_from_transient_failures() {
    let roads = MockRoads::failing(2);
    let retrying = RetryingProvider::new(roads, fast_retry(2));

    let distance = retrying.distance_km(ORIGIN, Coordinate::new(0.0, 1.0)).unwrap();
    assert!(distance.is_some());
    assert_eq!(retrying.inner().calls(), 3);
}

#[test]
fn exhausted_retries_surface_as_provider_error() {
    let retrying = RetryingProvider::new(MockRoads::failing(usize::MAX), fast_retry(2));

    let err = retrying.distance_km(ORIGIN, Coordinate::new(0.0, 1.0)).unwrap_err();
    assert!(matches!(err, ProviderError::Api { status: 503, .. }));
    assert_eq!(retrying.inner().calls(), 3);

    let planner = RoutePlanner::new(retrying);
    let err = planner
        .plan(ORIGIN, &[on_equator(1, 1.0)], &PlanOptions::default())
        .unwrap_err();
    assert!(err.is_provider());
}

#[test]
fn fallback_plan_matches_great_circle_plan() {
    let planner = RoutePlanner::new(RetryingProvider::new(MockRoads::failing(usize::MAX), fast_retry(0)));
    let candidates = bin_candidates();

    let fallback = planner
        .plan_or_fallback(DEPOT.coordinate(), &candidates, &PlanOptions::default())
        .unwrap();
    let direct = plan(&HaversineProvider, DEPOT.coordinate(), &candidates, &PlanOptions::default()).unwrap();
    assert_eq!(fallback, direct);
}

#[test]
fn batch_planning_shares_one_cache() {
    let roads = Arc::new(MockRoads::default());
    let planner = RoutePlanner::new(CachingProvider::new(Arc::clone(&roads)));
    let candidates = bin_candidates();

    let warm = planner
        .plan(DEPOT.coordinate(), &candidates, &PlanOptions::default())
        .unwrap();
    let warm_calls = roads.calls();

    let requests: Vec<_> = (0..8)
        .map(|_| PlanRequest {
            depot: DEPOT.coordinate(),
            candidates: candidates.clone(),
            options: PlanOptions::default(),
        })
        .collect();

    let results = planner.plan_batch(&requests);
    assert_eq!(results.len(), requests.len());
    for result in &results {
        assert_eq!(result.as_ref().unwrap(), &warm);
    }
    assert_eq!(roads.calls(), warm_calls, "batch should be served from the shared cache");
}

#[test]
fn plan_serializes_for_the_storage_layer() {
    let plan = RoutePlanner::new(NullProvider)
        .plan(DEPOT.coordinate(), &bin_candidates(), &PlanOptions::with_max_stops(3))
        .unwrap();

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["stops"].as_array().unwrap().len(), 3);
    assert_eq!(json["stop_cap"], 3);
    assert_eq!(json["stops"][0]["order_index"], 0);
}
