//! Real landmarks in Great Britain for realistic test fixtures.
//!
//! WGS84 coordinates from OpenStreetMap; grid references are the
//! 10-digit (1 m) National Grid squares containing each point.

/// A named location with coordinates and its grid reference.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub grid_ref: &'static str,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64, grid_ref: &'static str) -> Self {
        Self {
            name,
            lat,
            lng,
            grid_ref,
        }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    /// Decimal-degree notation, as a user would type it.
    pub fn decimal(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

// ============================================================================
// Central London
// ============================================================================

pub const LONDON: &[Location] = &[
    Location::new("Trafalgar Square", 51.50806, -0.12806, "TQ 30008 80453"),
    Location::new("Tower of London", 51.50811, -0.07595, "TQ 33624 80552"),
    Location::new("St Paul's Cathedral", 51.51378, -0.09841, "TQ 32049 81142"),
    Location::new("British Museum", 51.51940, -0.12698, "TQ 30051 81715"),
    Location::new("Buckingham Palace", 51.50136, -0.14189, "TQ 29068 79683"),
    Location::new("Westminster Abbey", 51.49929, -0.12731, "TQ 30085 79479"),
    Location::new("King's Cross", 51.53083, -0.12331, "TQ 30273 82993"),
];

// ============================================================================
// Elsewhere (far from the central meridian)
// ============================================================================

pub const REGIONAL: &[Location] = &[
    Location::new("Edinburgh Castle", 55.94861, -3.19972, "NT 25175 73491"),
    Location::new("Norwich Cathedral", 52.63199, 1.30111, "TG 23488 08920"),
];

/// Every fixture location.
pub fn all() -> Vec<&'static Location> {
    LONDON.iter().chain(REGIONAL.iter()).collect()
}
