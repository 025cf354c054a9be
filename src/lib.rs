//! waypoint-planner core
//!
//! Normalizes heterogeneous location notations (decimal degrees,
//! degree-minute-second, grid references, northing/easting) into WGS84
//! coordinates and finds the cheapest order to visit them.

pub mod error;
pub mod coordinate;
pub mod datum;
pub mod geodesy;
pub mod classifier;
pub mod normalizer;
pub mod traits;
pub mod solver;
pub mod osrm;
pub mod haversine;
pub mod nominatim;
pub mod config;
pub mod planner;

pub use coordinate::CanonicalCoordinate;
pub use error::{PlannerError, PlannerResult};
