//! Reduces any supported location notation to a canonical coordinate.

use tracing::{debug, warn};

use crate::classifier::{Dms, LocationFormat, classify};
use crate::coordinate::CanonicalCoordinate;
use crate::datum::DatumStore;
use crate::error::{PlannerError, PlannerResult};
use crate::geodesy::{GeodeticEngine, TransformTolerance};
use crate::traits::GeocodingService;

/// Geocoder for offline use: every free-text lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeocoding;

impl GeocodingService for NoGeocoding {
    fn geocode(&self, query: &str) -> PlannerResult<CanonicalCoordinate> {
        Err(PlannerError::format(query, "no recognised notation and geocoding is disabled"))
    }
}

pub struct CoordinateNormalizer<'a, G> {
    engine: GeodeticEngine<'a>,
    datum: String,
    geocoder: G,
}

impl<'a, G: GeocodingService> CoordinateNormalizer<'a, G> {
    /// Fails with a lookup error if `datum` is not in `store`.
    pub fn new(
        store: &'a DatumStore,
        datum: impl Into<String>,
        tolerance: TransformTolerance,
        geocoder: G,
    ) -> PlannerResult<Self> {
        let datum = datum.into();
        store.get(&datum)?;
        Ok(Self {
            engine: GeodeticEngine::new(store, tolerance),
            datum,
            geocoder,
        })
    }

    pub fn datum(&self) -> &str {
        &self.datum
    }

    pub fn engine(&self) -> &GeodeticEngine<'a> {
        &self.engine
    }

    /// Converts one raw location to WGS84.
    ///
    /// Decimal input keeps its value but not its spelling: `51.50740, -0.1278`
    /// comes back as `51.5074,-0.1278`.
    pub fn standardise(&self, raw: &str) -> PlannerResult<CanonicalCoordinate> {
        let format = classify(raw);
        debug!(input = raw, format = format.name(), "classified location");

        match format {
            LocationFormat::Decimal { lat, lon } => CanonicalCoordinate::new(lat, lon),
            LocationFormat::DegMinSec { lat, lon } => {
                CanonicalCoordinate::new(sexagesimal(raw, &lat)?, sexagesimal(raw, &lon)?)
            }
            LocationFormat::GridRef(code) => self.engine.map_ref_convert(&code, &self.datum),
            LocationFormat::NorthingEasting(en) => {
                self.engine.northing_easting_to_degrees(en, &self.datum)
            }
            LocationFormat::Unrecognized => self.geocoder.geocode(raw.trim()).inspect_err(|err| {
                warn!(input = raw, %err, "geocoding fallback failed");
            }),
        }
    }

    /// Standardises every input, stopping at the first failure.
    pub fn standardise_all<S: AsRef<str>>(&self, raw: &[S]) -> PlannerResult<Vec<CanonicalCoordinate>> {
        raw.iter().map(|input| self.standardise(input.as_ref())).collect()
    }
}

/// Decimal degrees for one axis; minutes and seconds must stay below 60.
fn sexagesimal(raw: &str, axis: &Dms) -> PlannerResult<f64> {
    if axis.minutes >= 60 || axis.seconds >= 60.0 {
        return Err(PlannerError::format(raw, "minutes and seconds must be below 60"));
    }
    Ok(axis.to_decimal())
}
