//! Nominatim (OpenStreetMap) adapter for free-text geocoding.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinate::CanonicalCoordinate;
use crate::error::{PlannerError, PlannerResult};
use crate::traits::GeocodingService;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NominatimConfig {
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying user agent.
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("waypoint-planner/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    config: NominatimConfig,
    client: reqwest::blocking::Client,
}

impl NominatimGeocoder {
    pub fn new(config: NominatimConfig) -> PlannerResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }
}

impl GeocodingService for NominatimGeocoder {
    fn geocode(&self, query: &str) -> PlannerResult<CanonicalCoordinate> {
        debug!(query, "geocoding via Nominatim");
        let places = self
            .client
            .get(self.search_url())
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()?
            .error_for_status()?
            .json::<Vec<NominatimPlace>>()?;

        best_match(query, places)
    }
}

fn best_match(query: &str, places: Vec<NominatimPlace>) -> PlannerResult<CanonicalCoordinate> {
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| PlannerError::format(query, "no geocoding match"))?;
    // Nominatim returns coordinates as strings.
    let lat = place
        .lat
        .parse::<f64>()
        .map_err(|err| PlannerError::Provider(format!("bad latitude {:?}: {err}", place.lat)))?;
    let lon = place
        .lon
        .parse::<f64>()
        .map_err(|err| PlannerError::Provider(format!("bad longitude {:?}: {err}", place.lon)))?;
    CanonicalCoordinate::new(lat, lon)
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(lat: &str, lon: &str) -> NominatimPlace {
        NominatimPlace {
            lat: lat.to_string(),
            lon: lon.to_string(),
        }
    }

    #[test]
    fn first_place_wins() {
        let coord = best_match("x", vec![place("51.5007", "-0.1246"), place("0", "0")]).unwrap();
        assert_eq!(coord.as_tuple(), (51.5007, -0.1246));
    }

    #[test]
    fn no_places_is_a_format_error() {
        assert!(matches!(best_match("nowhere", Vec::new()), Err(PlannerError::Format { .. })));
    }

    #[test]
    fn garbage_coordinates_are_provider_errors() {
        assert!(matches!(
            best_match("x", vec![place("north", "0")]),
            Err(PlannerError::Provider(_))
        ));
    }

    #[test]
    fn search_url_drops_trailing_slash() {
        let geocoder = NominatimGeocoder::new(NominatimConfig {
            base_url: "http://geo.local/".to_string(),
            ..NominatimConfig::default()
        })
        .unwrap();
        assert_eq!(geocoder.search_url(), "http://geo.local/search");
    }
}
