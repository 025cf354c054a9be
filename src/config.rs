//! Planner configuration, built once and passed explicitly.

use serde::{Deserialize, Serialize};

use crate::datum::AIRY_1830;
use crate::geodesy::TransformTolerance;
use crate::nominatim::NominatimConfig;
use crate::osrm::OsrmConfig;
use crate::solver::SolveOptions;
use crate::traits::TransportMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Datum that grid references and northing/easting inputs are on.
    pub datum: String,
    pub mode: TransportMode,
    pub tolerance: TransformTolerance,
    pub solve: SolveOptions,
    pub osrm: OsrmConfig,
    pub nominatim: NominatimConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            datum: AIRY_1830.to_string(),
            mode: TransportMode::default(),
            tolerance: TransformTolerance::default(),
            solve: SolveOptions::default(),
            osrm: OsrmConfig::default(),
            nominatim: NominatimConfig::default(),
        }
    }
}
