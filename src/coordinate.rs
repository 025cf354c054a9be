//! Canonical decimal-degree coordinate.
//!
//! This is the single interchange form between the normalizer, the
//! distance-matrix providers and the planner. It always renders latitude
//! first, comma separated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCoordinate {
    lat: f64,
    lon: f64,
}

impl CanonicalCoordinate {
    /// Builds a coordinate, rejecting values outside the valid ranges.
    pub fn new(lat: f64, lon: f64) -> PlannerResult<Self> {
        check_range("latitude", lat, 90.0)?;
        check_range("longitude", lon, 180.0)?;
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// (lat, lon) tuple.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

fn check_range(axis: &'static str, value: f64, limit: f64) -> PlannerResult<()> {
    // NaN fails the contains check as well.
    if (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(PlannerError::CoordinateOutOfRange {
            axis,
            value,
            min: -limit,
            max: limit,
        })
    }
}

impl fmt::Display for CanonicalCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl FromStr for CanonicalCoordinate {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| PlannerError::format(s, "expected \"lat,lon\""))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|err| PlannerError::format(s, format!("latitude: {err}")))?;
        let lon = lon
            .trim()
            .parse::<f64>()
            .map_err(|err| PlannerError::format(s, format!("longitude: {err}")))?;
        Self::new(lat, lon)
    }
}
