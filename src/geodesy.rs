//! Geodetic transform chain.
//!
//! Grid reference → northing/easting → local latitude/longitude (inverse
//! transverse Mercator) → Cartesian → Helmert shift → WGS84
//! latitude/longitude. The formulae follow the Ordnance Survey's
//! "A guide to coordinate systems in Great Britain" (Redfearn series
//! carried to the 7th power of the easting offset).
//!
//! The step functions are pure and only read [`DatumParameters`].
//! [`GeodeticEngine`] chains them against a [`DatumStore`].

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::coordinate::CanonicalCoordinate;
use crate::datum::{Datum, DatumParameters, DatumStore, WGS84};
use crate::error::{PlannerError, PlannerResult};

const ARCSECONDS_TO_RADIANS: f64 = PI / (180.0 * 3600.0);

/// Digit counts accepted in a grid reference (both axes together).
const GRID_DIGITS: [usize; 4] = [4, 6, 8, 10];

/// Convergence settings for the iterative transforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformTolerance {
    /// Residual northing (m) below which the meridian-arc inversion stops.
    pub northing: f64,
    /// Change in latitude (rad) below which the Cartesian inversion stops.
    pub latitude: f64,
    pub max_iterations: usize,
}

impl Default for TransformTolerance {
    fn default() -> Self {
        Self {
            northing: 1e-5,
            latitude: 1e-12,
            max_iterations: 64,
        }
    }
}

/// Projected coordinates in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NorthingEasting {
    pub easting: f64,
    pub northing: f64,
}

/// Latitude/longitude on a datum's own ellipsoid, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalLatLon {
    pub lat: f64,
    pub lon: f64,
    /// Footpoint latitude reached by the meridian-arc iteration.
    pub footpoint_lat: f64,
}

/// Earth-centred Cartesian coordinates in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cartesian {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Resolves a two-letter grid reference into northing/easting.
///
/// Whitespace is ignored and the prefix is case-insensitive. The digits are
/// split evenly: the first half is the easting, the second the northing,
/// each scaled to metres by its precision.
pub fn grid_ref_to_northing_easting(code: &str, datum: &Datum) -> PlannerResult<NorthingEasting> {
    let compact: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < 2 || !compact.is_char_boundary(2) {
        return Err(PlannerError::format(code, "grid reference too short"));
    }
    let (prefix, digits) = compact.split_at(2);
    if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PlannerError::format(code, "grid square must be two letters"));
    }
    if !GRID_DIGITS.contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PlannerError::format(code, "expected 4, 6, 8 or 10 digits"));
    }

    let (square_northing, square_easting) = datum.grid.offset(prefix)?;
    let half = digits.len() / 2;
    let unit = 10f64.powi((5 - half) as i32);
    let (east_digits, north_digits) = digits.split_at(half);
    // At most five ASCII digits per axis, so these parses cannot overflow.
    let east = east_digits
        .parse::<u32>()
        .map_err(|err| PlannerError::format(code, err.to_string()))?;
    let north = north_digits
        .parse::<u32>()
        .map_err(|err| PlannerError::format(code, err.to_string()))?;

    Ok(NorthingEasting {
        easting: square_easting + f64::from(east) * unit,
        northing: square_northing + f64::from(north) * unit,
    })
}

/// Inverse of [`grid_ref_to_northing_easting`] at the given precision.
///
/// The point is truncated to the south-west corner of its cell, as grid
/// references are. Output looks like `TQ 30034 80381`.
pub fn northing_easting_to_grid_ref(
    en: NorthingEasting,
    digits: usize,
    datum: &Datum,
) -> PlannerResult<String> {
    if !GRID_DIGITS.contains(&digits) {
        return Err(PlannerError::ContractViolation(format!(
            "grid references have 4, 6, 8 or 10 digits, not {digits}"
        )));
    }
    let square_easting = (en.easting / 100_000.0).floor() * 100_000.0;
    let square_northing = (en.northing / 100_000.0).floor() * 100_000.0;
    let code = datum
        .grid
        .square_for(square_northing, square_easting)
        .ok_or_else(|| PlannerError::grid_square(&format!("{square_easting},{square_northing}")))?;

    let half = digits / 2;
    let unit = 10f64.powi((5 - half) as i32);
    let east = ((en.easting - square_easting) / unit).floor() as u32;
    let north = ((en.northing - square_northing) / unit).floor() as u32;
    Ok(format!("{code} {east:0half$} {north:0half$}"))
}

/// Meridian arc from the true-origin latitude to `lat`, scaled by F0.
fn meridian_arc(params: &DatumParameters, lat: f64, lat0: f64) -> f64 {
    let n = params.n();
    let (n2, n3) = (n * n, n * n * n);
    let dlat = lat - lat0;
    let slat = lat + lat0;

    let m1 = (1.0 + n + 1.25 * n2 + 1.25 * n3) * dlat;
    let m2 = (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * dlat.sin() * slat.cos();
    let m3 = (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * dlat).sin() * (2.0 * slat).cos();
    let m4 = 35.0 / 24.0 * n3 * (3.0 * dlat).sin() * (3.0 * slat).cos();

    params.semi_minor * params.scale_factor * (m1 - m2 + m3 - m4)
}

/// Radii of curvature (ν transverse, ρ meridional) scaled by F0, and η².
fn curvature(params: &DatumParameters, lat: f64) -> (f64, f64, f64) {
    let e2 = params.e2();
    let af0 = params.semi_major * params.scale_factor;
    let s2 = 1.0 - e2 * lat.sin().powi(2);
    let nu = af0 / s2.sqrt();
    let rho = af0 * (1.0 - e2) * s2.powf(-1.5);
    (nu, rho, nu / rho - 1.0)
}

/// Inverse transverse Mercator: northing/easting to local latitude/longitude.
pub fn northing_easting_to_local_lat_lon(
    en: NorthingEasting,
    params: &DatumParameters,
    tolerance: &TransformTolerance,
) -> PlannerResult<LocalLatLon> {
    let lat0 = params.origin_lat.to_radians();
    let lon0 = params.origin_lon.to_radians();
    let af0 = params.semi_major * params.scale_factor;
    let north = en.northing - params.origin_northing;

    let mut lat = lat0;
    let mut arc = 0.0;
    let mut converged = false;
    for iteration in 1..=tolerance.max_iterations {
        lat += (north - arc) / af0;
        arc = meridian_arc(params, lat, lat0);
        if (north - arc).abs() < tolerance.northing {
            trace!(iteration, "meridian arc converged");
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(PlannerError::Convergence {
            transform: "meridian arc inversion",
            iterations: tolerance.max_iterations,
        });
    }

    let (nu, rho, eta2) = curvature(params, lat);
    let t = lat.tan();
    let (t2, t4, t6) = (t * t, t.powi(4), t.powi(6));
    let sec = 1.0 / lat.cos();

    let vii = t / (2.0 * rho * nu);
    let viii = t / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * t2 + eta2 - 9.0 * t2 * eta2);
    let ix = t / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * t2 + 45.0 * t4);
    let x = sec / nu;
    let xi = sec / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * t2);
    let xii = sec / (120.0 * nu.powi(5)) * (5.0 + 28.0 * t2 + 24.0 * t4);
    let xiia = sec / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * t2 + 1320.0 * t4 + 720.0 * t6);

    let de = en.easting - params.origin_easting;
    Ok(LocalLatLon {
        lat: lat - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6),
        lon: lon0 + x * de - xi * de.powi(3) + xii * de.powi(5) - xiia * de.powi(7),
        footpoint_lat: lat,
    })
}

/// Forward transverse Mercator: local latitude/longitude (degrees) to
/// northing/easting.
pub fn lat_lon_to_northing_easting(lat: f64, lon: f64, params: &DatumParameters) -> NorthingEasting {
    let lat0 = params.origin_lat.to_radians();
    let lat = lat.to_radians();
    let dlon = lon.to_radians() - params.origin_lon.to_radians();

    let (nu, rho, eta2) = curvature(params, lat);
    let (s, c, t) = (lat.sin(), lat.cos(), lat.tan());
    let (t2, t4) = (t * t, t.powi(4));

    let i = meridian_arc(params, lat, lat0) + params.origin_northing;
    let ii = nu / 2.0 * s * c;
    let iii = nu / 24.0 * s * c.powi(3) * (5.0 - t2 + 9.0 * eta2);
    let iiia = nu / 720.0 * s * c.powi(5) * (61.0 - 58.0 * t2 + t4);
    let iv = nu * c;
    let v = nu / 6.0 * c.powi(3) * (nu / rho - t2);
    let vi = nu / 120.0 * c.powi(5) * (5.0 - 18.0 * t2 + t4 + 14.0 * eta2 - 58.0 * t2 * eta2);

    NorthingEasting {
        easting: params.origin_easting + iv * dlon + v * dlon.powi(3) + vi * dlon.powi(5),
        northing: i + ii * dlon.powi(2) + iii * dlon.powi(4) + iiia * dlon.powi(6),
    }
}

/// Ellipsoidal (height zero) to Cartesian. Angles in radians; the radius of
/// curvature is evaluated at `lat_for_curvature`.
pub fn local_lat_lon_to_cartesian(
    lat: f64,
    lon: f64,
    lat_for_curvature: f64,
    params: &DatumParameters,
) -> Cartesian {
    let e2 = params.e2();
    let sf = params.scale_factor;
    let nu = params.semi_major * sf / (1.0 - e2 * lat_for_curvature.sin().powi(2)).sqrt();
    let r = nu / sf;
    Cartesian {
        x: r * lat.cos() * lon.cos(),
        y: r * lat.cos() * lon.sin(),
        z: (1.0 - e2) * r * lat.sin(),
    }
}

fn helmert(c: Cartesian, params: &DatumParameters, sign: f64) -> Cartesian {
    let tx = sign * params.tx;
    let ty = sign * params.ty;
    let tz = sign * params.tz;
    let s = 1.0 + sign * params.scale_ppm * 1e-6;
    let rx = sign * params.rx * ARCSECONDS_TO_RADIANS;
    let ry = sign * params.ry * ARCSECONDS_TO_RADIANS;
    let rz = sign * params.rz * ARCSECONDS_TO_RADIANS;

    Cartesian {
        x: tx + s * c.x - rz * c.y + ry * c.z,
        y: ty + rz * c.x + s * c.y - rx * c.z,
        z: tz - ry * c.x + rx * c.y + s * c.z,
    }
}

/// Seven-parameter Helmert transform from the datum into WGS84.
pub fn cartesian_shift(c: Cartesian, params: &DatumParameters) -> Cartesian {
    helmert(c, params, 1.0)
}

/// Approximate inverse of [`cartesian_shift`] (parameters negated).
pub fn cartesian_unshift(c: Cartesian, params: &DatumParameters) -> Cartesian {
    helmert(c, params, -1.0)
}

/// Cartesian to geodetic latitude/longitude in degrees on `params`' ellipsoid.
pub fn cartesian_to_lat_lon(
    c: Cartesian,
    params: &DatumParameters,
    tolerance: &TransformTolerance,
) -> PlannerResult<(f64, f64)> {
    let e2 = params.e2();
    let p = c.x.hypot(c.y);

    let mut lat = c.z.atan2(p * (1.0 - e2));
    for iteration in 1..=tolerance.max_iterations {
        let nu = params.semi_major / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        let next = (c.z + e2 * nu * lat.sin()).atan2(p);
        let delta = (next - lat).abs();
        lat = next;
        if delta < tolerance.latitude {
            trace!(iteration, "geodetic latitude converged");
            return Ok((lat.to_degrees(), c.y.atan2(c.x).to_degrees()));
        }
    }

    Err(PlannerError::Convergence {
        transform: "geodetic latitude",
        iterations: tolerance.max_iterations,
    })
}

/// Chains the transforms against a datum store, always ending in WGS84.
#[derive(Debug, Clone, Copy)]
pub struct GeodeticEngine<'a> {
    store: &'a DatumStore,
    tolerance: TransformTolerance,
}

impl<'a> GeodeticEngine<'a> {
    pub fn new(store: &'a DatumStore, tolerance: TransformTolerance) -> Self {
        Self { store, tolerance }
    }

    pub fn store(&self) -> &'a DatumStore {
        self.store
    }

    /// Northing/easting on `datum` to a WGS84 coordinate.
    pub fn northing_easting_to_degrees(
        &self,
        en: NorthingEasting,
        datum: &str,
    ) -> PlannerResult<CanonicalCoordinate> {
        let source = &self.store.get(datum)?.params;
        let target = &self.store.get(WGS84)?.params;

        let local = northing_easting_to_local_lat_lon(en, source, &self.tolerance)?;
        // Height-zero point: curvature is taken at the point's own latitude.
        let cartesian = local_lat_lon_to_cartesian(local.lat, local.lon, local.lat, source);
        let shifted = cartesian_shift(cartesian, source);
        let (lat, lon) = cartesian_to_lat_lon(shifted, target, &self.tolerance)?;
        CanonicalCoordinate::new(lat, lon)
    }

    /// Grid reference on `datum` to a WGS84 coordinate.
    pub fn map_ref_convert(&self, grid_ref: &str, datum: &str) -> PlannerResult<CanonicalCoordinate> {
        let en = grid_ref_to_northing_easting(grid_ref, self.store.get(datum)?)?;
        self.northing_easting_to_degrees(en, datum)
    }

    /// WGS84 coordinate back onto `datum`'s projection.
    pub fn degrees_to_northing_easting(
        &self,
        coord: CanonicalCoordinate,
        datum: &str,
    ) -> PlannerResult<NorthingEasting> {
        let target = &self.store.get(datum)?.params;
        let wgs = &self.store.get(WGS84)?.params;

        let lat = coord.lat().to_radians();
        let lon = coord.lon().to_radians();
        let cartesian = local_lat_lon_to_cartesian(lat, lon, lat, wgs);
        let unshifted = cartesian_unshift(cartesian, target);
        let (lat, lon) = cartesian_to_lat_lon(unshifted, target, &self.tolerance)?;
        Ok(lat_lon_to_northing_easting(lat, lon, target))
    }
}
