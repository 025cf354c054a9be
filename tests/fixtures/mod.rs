//! Test fixtures for waypoint-planner.
//!
//! Provides real locations in Great Britain with both their WGS84
//! coordinates and their OSGB36 National Grid references.

pub mod gb_locations;

pub use gb_locations::*;
