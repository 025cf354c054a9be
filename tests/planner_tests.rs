//! End-to-end planning over mixed notations with local matrix providers.

mod fixtures;

use std::cell::Cell;

use waypoint_planner::config::PlannerConfig;
use waypoint_planner::datum::{AIRY_1830, DatumStore};
use waypoint_planner::geodesy::TransformTolerance;
use waypoint_planner::haversine::HaversineMatrix;
use waypoint_planner::normalizer::{CoordinateNormalizer, NoGeocoding};
use waypoint_planner::planner::RoutePlanner;
use waypoint_planner::solver::{DistanceMatrix, SolveOptions, SolveStrategy};
use waypoint_planner::traits::{DistanceMatrixProvider, TransportMode};
use waypoint_planner::{CanonicalCoordinate, PlannerError, PlannerResult};

// ============================================================================
// Test Providers
// ============================================================================

/// Manhattan distance in millidegrees; remembers the last mode asked for.
#[derive(Default)]
struct ManhattanMatrix {
    last_mode: Cell<Option<TransportMode>>,
}

impl DistanceMatrixProvider for ManhattanMatrix {
    fn matrix_for(
        &self,
        locations: &[CanonicalCoordinate],
        mode: TransportMode,
    ) -> PlannerResult<DistanceMatrix> {
        self.last_mode.set(Some(mode));
        let rows = locations
            .iter()
            .map(|from| {
                locations
                    .iter()
                    .map(|to| {
                        let d = (from.lat() - to.lat()).abs() + (from.lon() - to.lon()).abs();
                        (d * 1000.0).round() as u32
                    })
                    .collect()
            })
            .collect();
        DistanceMatrix::new(rows)
    }
}

/// Always answers with a 2x2 matrix, whatever it was asked.
struct FixedPair;

impl DistanceMatrixProvider for FixedPair {
    fn matrix_for(&self, _: &[CanonicalCoordinate], _: TransportMode) -> PlannerResult<DistanceMatrix> {
        DistanceMatrix::new(vec![vec![0, 1], vec![1, 0]])
    }
}

fn planner<M: DistanceMatrixProvider>(
    provider: M,
    options: SolveOptions,
) -> RoutePlanner<'static, NoGeocoding, M> {
    let normalizer = CoordinateNormalizer::new(
        DatumStore::builtin(),
        AIRY_1830,
        TransformTolerance::default(),
        NoGeocoding,
    )
    .unwrap();
    RoutePlanner::new(normalizer, provider, options)
}

// ============================================================================
// Planning
// ============================================================================

#[test]
fn mixed_notations_along_a_line() {
    // Roughly west to east across central London, given out of order.
    let inputs = [
        "TQ 33624 80552",          // Tower of London
        "51.50136,-0.14189",       // Buckingham Palace
        "532049,181142",           // St Paul's Cathedral
        "51°30'29\"N 0°7'41\"W",   // Trafalgar Square
    ];
    let provider = ManhattanMatrix::default();
    let plan = planner(&provider, SolveOptions::default())
        .plan(&inputs, TransportMode::Walking)
        .unwrap();

    assert_eq!(plan.strategy, SolveStrategy::Exhaustive);
    assert_eq!(plan.locations.len(), 4);
    let order = &plan.route.order;
    assert!(
        *order == [1, 3, 2, 0] || *order == [0, 2, 3, 1],
        "unexpected order {order:?}"
    );
    assert_eq!(provider.last_mode.get(), Some(TransportMode::Walking));

    let ordered: Vec<_> = plan.ordered_locations().collect();
    assert_eq!(ordered.len(), 4);
    assert_eq!(ordered[0], plan.locations[order[0]]);
}

#[test]
fn auto_falls_back_to_heuristic_above_ceiling() {
    let inputs: Vec<String> = fixtures::all().iter().map(|l| l.grid_ref.to_string()).collect();
    let options = SolveOptions {
        max_exhaustive_locations: 4,
        ..SolveOptions::default()
    };
    let plan = planner(ManhattanMatrix::default(), options)
        .plan(&inputs, TransportMode::Driving)
        .unwrap();

    assert_eq!(plan.strategy, SolveStrategy::Heuristic);
    let mut order = plan.route.order.clone();
    order.sort_unstable();
    assert_eq!(order, (0..inputs.len()).collect::<Vec<_>>());
}

#[test]
fn haversine_plan_over_landmarks() {
    let inputs: Vec<String> = fixtures::LONDON.iter().map(|l| l.decimal()).collect();
    let plan = planner(HaversineMatrix::default(), SolveOptions::default())
        .plan(&inputs, TransportMode::Walking)
        .unwrap();

    assert_eq!(plan.strategy, SolveStrategy::Exhaustive);
    // Seven landmarks within a few kilometres: well under three hours on foot.
    assert!(plan.route.cost > 0 && plan.route.cost < 3 * 3600, "{}", plan.route.cost);
    for (location, coord) in fixtures::LONDON.iter().zip(&plan.locations) {
        assert_eq!(coord.as_tuple(), location.coords());
    }
}

#[test]
fn single_location_plan() {
    let plan = planner(HaversineMatrix::default(), SolveOptions::default())
        .plan(&["NT 25175 73491"], TransportMode::Bicycling)
        .unwrap();
    assert_eq!(plan.route.order, vec![0]);
    assert_eq!(plan.route.cost, 0);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn empty_input_is_rejected() {
    let empty: [&str; 0] = [];
    let err = planner(ManhattanMatrix::default(), SolveOptions::default())
        .plan(&empty, TransportMode::Walking)
        .unwrap_err();
    assert!(matches!(err, PlannerError::ContractViolation(_)));
}

#[test]
fn mismatched_matrix_is_a_provider_error() {
    let err = planner(FixedPair, SolveOptions::default())
        .plan(&["51.5,-0.1", "51.6,-0.1", "51.7,-0.1"], TransportMode::Walking)
        .unwrap_err();
    assert!(matches!(err, PlannerError::Provider(_)));
}

#[test]
fn unrecognised_location_stops_the_plan() {
    let provider = ManhattanMatrix::default();
    let err = planner(&provider, SolveOptions::default())
        .plan(&["51.5,-0.1", "somewhere nice"], TransportMode::Walking)
        .unwrap_err();
    assert!(matches!(err, PlannerError::Format { .. }));
    assert_eq!(provider.last_mode.get(), None);
}

#[test]
fn planner_from_default_config() {
    let config = PlannerConfig::default();
    let planner = RoutePlanner::from_config(
        &config,
        DatumStore::builtin(),
        NoGeocoding,
        HaversineMatrix::default(),
    )
    .unwrap();
    assert_eq!(planner.normalizer().datum(), AIRY_1830);

    let plan = planner.plan(&["TQ 30008 80453", "TQ 30085 79479"], config.mode).unwrap();
    assert_eq!(plan.route.order.len(), 2);
}

#[test]
fn config_with_unknown_datum_fails() {
    let config = PlannerConfig {
        datum: "Bessel 1841".to_string(),
        ..PlannerConfig::default()
    };
    let result = RoutePlanner::from_config(
        &config,
        DatumStore::builtin(),
        NoGeocoding,
        HaversineMatrix::default(),
    );
    assert!(matches!(result, Err(PlannerError::DatumLookup { .. })));
}
