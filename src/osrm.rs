//! OSRM HTTP adapter for distance matrices.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinate::CanonicalCoordinate;
use crate::error::{PlannerError, PlannerResult};
use crate::solver::DistanceMatrix;
use crate::traits::{DistanceMatrixProvider, TransportMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> PlannerResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// OSRM routing profile for a transport mode.
    pub fn profile(mode: TransportMode) -> PlannerResult<&'static str> {
        match mode {
            TransportMode::Walking => Ok("foot"),
            TransportMode::Bicycling => Ok("bike"),
            TransportMode::Driving => Ok("car"),
            TransportMode::Transit => Err(PlannerError::UnsupportedMode(mode.to_string())),
        }
    }

    fn table_url(&self, locations: &[CanonicalCoordinate], profile: &str) -> String {
        // OSRM wants lon,lat pairs.
        let coords = locations
            .iter()
            .map(|coord| format!("{:.6},{:.6}", coord.lon(), coord.lat()))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations=duration",
            self.config.base_url.trim_end_matches('/'),
            profile,
            coords
        )
    }
}

impl DistanceMatrixProvider for OsrmClient {
    fn matrix_for(
        &self,
        locations: &[CanonicalCoordinate],
        mode: TransportMode,
    ) -> PlannerResult<DistanceMatrix> {
        if locations.is_empty() {
            return Err(PlannerError::ContractViolation(
                "no locations to build a matrix for".to_string(),
            ));
        }

        let url = self.table_url(locations, Self::profile(mode)?);
        debug!(locations = locations.len(), %mode, "requesting OSRM table");

        let body = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .json::<OsrmTableResponse>()?;

        durations_to_matrix(body)
    }
}

fn durations_to_matrix(body: OsrmTableResponse) -> PlannerResult<DistanceMatrix> {
    if body.code != "Ok" {
        return Err(PlannerError::Provider(format!(
            "OSRM answered {}: {}",
            body.code,
            body.message.unwrap_or_default()
        )));
    }
    let durations = body
        .durations
        .ok_or_else(|| PlannerError::Provider("OSRM response has no durations".to_string()))?;

    let rows = durations
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            row.into_iter()
                .enumerate()
                .map(|(j, value)| match value {
                    Some(seconds) if seconds >= 0.0 => Ok(seconds.round() as u32),
                    _ => Err(PlannerError::Provider(format!("no route from {i} to {j}"))),
                })
                .collect::<PlannerResult<Vec<_>>>()
        })
        .collect::<PlannerResult<Vec<_>>>()?;

    DistanceMatrix::new(rows)
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    message: Option<String>,
    durations: Option<Vec<Vec<Option<f64>>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(durations: Option<Vec<Vec<Option<f64>>>>) -> OsrmTableResponse {
        OsrmTableResponse {
            code: "Ok".to_string(),
            message: None,
            durations,
        }
    }

    #[test]
    fn profiles_cover_road_modes() {
        assert_eq!(OsrmClient::profile(TransportMode::Walking).unwrap(), "foot");
        assert_eq!(OsrmClient::profile(TransportMode::Bicycling).unwrap(), "bike");
        assert_eq!(OsrmClient::profile(TransportMode::Driving).unwrap(), "car");
        assert!(matches!(
            OsrmClient::profile(TransportMode::Transit),
            Err(PlannerError::UnsupportedMode(_))
        ));
    }

    #[test]
    fn table_url_uses_lon_lat_order() {
        let client = OsrmClient::new(OsrmConfig {
            base_url: "http://osrm.local/".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        let locations = vec![
            CanonicalCoordinate::new(51.5, -0.12).unwrap(),
            CanonicalCoordinate::new(51.6, -0.2).unwrap(),
        ];
        assert_eq!(
            client.table_url(&locations, "foot"),
            "http://osrm.local/table/v1/foot/-0.120000,51.500000;-0.200000,51.600000?annotations=duration"
        );
    }

    #[test]
    fn durations_are_rounded_into_matrix() {
        let matrix = durations_to_matrix(response(Some(vec![
            vec![Some(0.0), Some(12.4)],
            vec![Some(13.6), Some(0.0)],
        ])))
        .unwrap();
        assert_eq!(matrix.rows(), &[vec![0u32, 12], vec![14, 0]]);
    }

    #[test]
    fn unreachable_pair_is_a_provider_error() {
        let err = durations_to_matrix(response(Some(vec![
            vec![Some(0.0), None],
            vec![Some(3.0), Some(0.0)],
        ])))
        .unwrap_err();
        assert!(matches!(err, PlannerError::Provider(_)));
    }

    #[test]
    fn error_code_is_reported() {
        let body = OsrmTableResponse {
            code: "InvalidQuery".to_string(),
            message: Some("bad coordinates".to_string()),
            durations: None,
        };
        assert!(matches!(durations_to_matrix(body), Err(PlannerError::Provider(_))));
    }
}
