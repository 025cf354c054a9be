//! Haversine distance matrix provider (fallback when OSRM is unavailable).
//!
//! Uses great-circle distance and a per-mode average speed to estimate
//! travel time. Less accurate than OSRM (ignores roads) but always available.

use serde::{Deserialize, Serialize};

use crate::coordinate::CanonicalCoordinate;
use crate::error::{PlannerError, PlannerResult};
use crate::solver::DistanceMatrix;
use crate::traits::{DistanceMatrixProvider, TransportMode};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average speeds (km/h) per transport mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HaversineMatrix {
    pub walking_kmh: f64,
    pub bicycling_kmh: f64,
    pub driving_kmh: f64,
    pub transit_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            walking_kmh: 5.0,
            bicycling_kmh: 15.0,
            driving_kmh: 40.0,
            transit_kmh: 25.0,
        }
    }
}

impl HaversineMatrix {
    /// Same speed for every mode.
    pub fn uniform(speed_kmh: f64) -> Self {
        Self {
            walking_kmh: speed_kmh,
            bicycling_kmh: speed_kmh,
            driving_kmh: speed_kmh,
            transit_kmh: speed_kmh,
        }
    }

    pub fn speed_kmh(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Walking => self.walking_kmh,
            TransportMode::Bicycling => self.bicycling_kmh,
            TransportMode::Driving => self.driving_kmh,
            TransportMode::Transit => self.transit_kmh,
        }
    }

    /// Calculate haversine distance between two points in kilometers.
    fn haversine_km(from: CanonicalCoordinate, to: CanonicalCoordinate) -> f64 {
        let lat1_rad = from.lat().to_radians();
        let lat2_rad = to.lat().to_radians();
        let delta_lat = (to.lat() - from.lat()).to_radians();
        let delta_lng = (to.lon() - from.lon()).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Convert distance in km to travel time in seconds.
    fn km_to_seconds(km: f64, speed_kmh: f64) -> u32 {
        let hours = km / speed_kmh;
        (hours * 3600.0).round() as u32
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(
        &self,
        locations: &[CanonicalCoordinate],
        mode: TransportMode,
    ) -> PlannerResult<DistanceMatrix> {
        let speed = self.speed_kmh(mode);
        if speed.is_nan() || speed <= 0.0 {
            return Err(PlannerError::ContractViolation(format!(
                "{mode} speed must be positive, got {speed}"
            )));
        }

        let n = locations.len();
        let mut matrix = vec![vec![0; n]; n];
        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i != j {
                    let km = Self::haversine_km(*from, *to);
                    matrix[i][j] = Self::km_to_seconds(km, speed);
                }
            }
        }

        DistanceMatrix::new(matrix)
    }
}
