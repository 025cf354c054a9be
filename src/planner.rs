//! End-to-end pipeline: raw strings → canonical coordinates → travel-time
//! matrix → visiting order.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PlannerConfig;
use crate::coordinate::CanonicalCoordinate;
use crate::datum::DatumStore;
use crate::error::{PlannerError, PlannerResult};
use crate::normalizer::CoordinateNormalizer;
use crate::solver::{Route, SolveOptions, SolveStrategy, solve};
use crate::traits::{DistanceMatrixProvider, GeocodingService, TransportMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedRoute {
    /// Canonical coordinates in input order; `route.order` indexes these.
    pub locations: Vec<CanonicalCoordinate>,
    pub route: Route,
    /// Search that produced `route`.
    pub strategy: SolveStrategy,
}

impl PlannedRoute {
    /// Locations in visiting order. Indices with no matching location are
    /// skipped.
    pub fn ordered_locations(&self) -> impl Iterator<Item = CanonicalCoordinate> + '_ {
        self.route
            .order
            .iter()
            .filter_map(|&index| self.locations.get(index).copied())
    }
}

pub struct RoutePlanner<'a, G, M> {
    normalizer: CoordinateNormalizer<'a, G>,
    provider: M,
    options: SolveOptions,
}

impl<'a, G, M> RoutePlanner<'a, G, M>
where
    G: GeocodingService,
    M: DistanceMatrixProvider,
{
    pub fn new(normalizer: CoordinateNormalizer<'a, G>, provider: M, options: SolveOptions) -> Self {
        Self {
            normalizer,
            provider,
            options,
        }
    }

    /// Wires a planner from configuration.
    pub fn from_config(
        config: &PlannerConfig,
        store: &'a DatumStore,
        geocoder: G,
        provider: M,
    ) -> PlannerResult<Self> {
        let normalizer = CoordinateNormalizer::new(store, config.datum.clone(), config.tolerance, geocoder)?;
        Ok(Self::new(normalizer, provider, config.solve.clone()))
    }

    pub fn normalizer(&self) -> &CoordinateNormalizer<'a, G> {
        &self.normalizer
    }

    pub fn plan<S: AsRef<str>>(&self, raw: &[S], mode: TransportMode) -> PlannerResult<PlannedRoute> {
        if raw.is_empty() {
            return Err(PlannerError::ContractViolation(
                "at least one location is required".to_string(),
            ));
        }

        let locations = self.normalizer.standardise_all(raw)?;
        let matrix = self.provider.matrix_for(&locations, mode)?;
        if matrix.len() != locations.len() {
            return Err(PlannerError::Provider(format!(
                "matrix covers {} locations, expected {}",
                matrix.len(),
                locations.len()
            )));
        }

        let (route, strategy) = solve(&matrix, &self.options)?;
        info!(
            locations = locations.len(),
            %mode,
            ?strategy,
            cost = route.cost,
            "planned route"
        );

        Ok(PlannedRoute {
            locations,
            route,
            strategy,
        })
    }
}
