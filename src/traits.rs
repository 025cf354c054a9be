//! Boundaries to the external collaborators.
//!
//! The planner core never talks to the network itself; it asks these
//! traits. Concrete adapters live in `osrm`, `haversine` and `nominatim`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coordinate::CanonicalCoordinate;
use crate::error::{PlannerError, PlannerResult};
use crate::solver::DistanceMatrix;

/// How the traveller moves between locations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Walking,
    Bicycling,
    Driving,
    Transit,
}

impl TransportMode {
    pub const ALL: [TransportMode; 4] = [
        TransportMode::Walking,
        TransportMode::Bicycling,
        TransportMode::Driving,
        TransportMode::Transit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Walking => "walking",
            TransportMode::Bicycling => "bicycling",
            TransportMode::Driving => "driving",
            TransportMode::Transit => "transit",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PlannerError::UnsupportedMode(s.to_string()))
    }
}

/// Provides a travel-time matrix (seconds) for a set of locations.
///
/// The matrix is indexed by the provided location order: entry `[i][j]` is
/// the cost of travelling from `locations[i]` to `locations[j]`.
pub trait DistanceMatrixProvider {
    fn matrix_for(
        &self,
        locations: &[CanonicalCoordinate],
        mode: TransportMode,
    ) -> PlannerResult<DistanceMatrix>;
}

/// Resolves free text to a single best-match coordinate.
pub trait GeocodingService {
    /// Fails with [`PlannerError::Format`] when nothing matches.
    fn geocode(&self, query: &str) -> PlannerResult<CanonicalCoordinate>;
}

impl<T: DistanceMatrixProvider + ?Sized> DistanceMatrixProvider for &T {
    fn matrix_for(
        &self,
        locations: &[CanonicalCoordinate],
        mode: TransportMode,
    ) -> PlannerResult<DistanceMatrix> {
        (**self).matrix_for(locations, mode)
    }
}

impl<T: GeocodingService + ?Sized> GeocodingService for &T {
    fn geocode(&self, query: &str) -> PlannerResult<CanonicalCoordinate> {
        (**self).geocode(query)
    }
}

impl<T: GeocodingService + ?Sized> GeocodingService for Box<T> {
    fn geocode(&self, query: &str) -> PlannerResult<CanonicalCoordinate> {
        (**self).geocode(query)
    }
}
