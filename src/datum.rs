//! Datum parameter store.
//!
//! Each datum is a small delimited record: the first data line carries the
//! ellipsoid, projection and Helmert constants, every following line maps a
//! two-letter grid square to its (northing, easting) offset in kilometres.
//! Records are parsed once and shared read-only for the process lifetime.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlannerError, PlannerResult};

/// Name of the reference datum every conversion ends in.
pub const WGS84: &str = "WGS84";

/// Datum used by the Ordnance Survey National Grid.
pub const AIRY_1830: &str = "Airy 1830";

const BUILTIN_RECORDS: &[(&str, &str)] = &[
    (AIRY_1830, include_str!("../data/airy_1830.txt")),
    (WGS84, include_str!("../data/wgs84.txt")),
];

const PARAMETER_FIELDS: usize = 14;

/// Ellipsoid, projection and Helmert constants for one datum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatumParameters {
    /// Semi-major axis (m).
    pub semi_major: f64,
    /// Semi-minor axis (m).
    pub semi_minor: f64,
    /// Scale factor on the central meridian.
    pub scale_factor: f64,
    /// True origin latitude (degrees).
    pub origin_lat: f64,
    /// True origin longitude (degrees).
    pub origin_lon: f64,
    /// Northing of the true origin (m).
    pub origin_northing: f64,
    /// Easting of the true origin (m).
    pub origin_easting: f64,
    /// Helmert translations towards WGS84 (m).
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    /// Helmert scale difference (ppm).
    pub scale_ppm: f64,
    /// Helmert rotations (arcseconds).
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl DatumParameters {
    /// First eccentricity squared.
    pub fn e2(&self) -> f64 {
        1.0 - (self.semi_minor * self.semi_minor) / (self.semi_major * self.semi_major)
    }

    /// Third flattening n = (a - b) / (a + b).
    pub fn n(&self) -> f64 {
        (self.semi_major - self.semi_minor) / (self.semi_major + self.semi_minor)
    }

    fn from_fields(fields: &[f64]) -> Self {
        Self {
            semi_major: fields[0],
            semi_minor: fields[1],
            scale_factor: fields[2],
            origin_lat: fields[3],
            origin_lon: fields[4],
            origin_northing: fields[5],
            origin_easting: fields[6],
            tx: fields[7],
            ty: fields[8],
            tz: fields[9],
            scale_ppm: fields[10],
            rx: fields[11],
            ry: fields[12],
            rz: fields[13],
        }
    }
}

/// Two-letter grid square to (northing, easting) offset in metres.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridOffsetTable {
    squares: HashMap<String, (f64, f64)>,
}

impl GridOffsetTable {
    /// Offset for a square code; lookup is case-insensitive.
    pub fn offset(&self, code: &str) -> PlannerResult<(f64, f64)> {
        self.squares
            .get(&code.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| PlannerError::grid_square(code))
    }

    /// Square whose south-west corner is exactly (northing, easting).
    pub fn square_for(&self, northing: f64, easting: f64) -> Option<&str> {
        self.squares
            .iter()
            .find(|(_, offset)| **offset == (northing, easting))
            .map(|(code, _)| code.as_str())
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }
}

/// A datum's constants together with its grid-square table.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub name: String,
    pub params: DatumParameters,
    pub grid: GridOffsetTable,
}

impl Datum {
    /// Parses one datum record.
    pub fn parse(name: &str, text: &str) -> PlannerResult<Self> {
        let record_error = |line: usize, reason: String| PlannerError::DatumRecord {
            datum: name.to_string(),
            line,
            reason,
        };

        let mut lines = text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        let (line_no, header) = lines
            .next()
            .ok_or_else(|| record_error(0, "missing parameter line".to_string()))?;
        let fields = header
            .split(',')
            .map(|field| field.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| record_error(line_no, err.to_string()))?;
        if fields.len() != PARAMETER_FIELDS {
            return Err(record_error(
                line_no,
                format!("expected {PARAMETER_FIELDS} fields, found {}", fields.len()),
            ));
        }
        let params = DatumParameters::from_fields(&fields);
        if !(params.semi_major > 0.0 && params.semi_minor > 0.0 && params.scale_factor > 0.0) {
            return Err(record_error(
                line_no,
                "axes and scale factor must be positive".to_string(),
            ));
        }

        let mut squares = HashMap::new();
        for (line_no, line) in lines {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            let [code, northing, easting] = parts.as_slice() else {
                return Err(record_error(
                    line_no,
                    format!("expected 3 grid fields, found {}", parts.len()),
                ));
            };
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(record_error(line_no, format!("bad grid square {code:?}")));
            }
            let northing = northing
                .parse::<f64>()
                .map_err(|err| record_error(line_no, err.to_string()))?;
            let easting = easting
                .parse::<f64>()
                .map_err(|err| record_error(line_no, err.to_string()))?;
            squares.insert(code.to_ascii_uppercase(), (northing * 1000.0, easting * 1000.0));
        }

        Ok(Self {
            name: name.to_string(),
            params,
            grid: GridOffsetTable { squares },
        })
    }
}

/// In-memory map of datums keyed by name.
#[derive(Debug, Clone, Default)]
pub struct DatumStore {
    datums: HashMap<String, Datum>,
}

impl DatumStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store holding the compiled-in datums.
    pub fn builtin() -> &'static DatumStore {
        static BUILTIN: OnceLock<DatumStore> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let mut store = DatumStore::new();
            for (name, text) in BUILTIN_RECORDS {
                // Compiled-in records are covered by tests; a bad one is a build defect.
                if let Err(err) = store.insert_records(name, text) {
                    tracing::error!(datum = name, %err, "builtin datum record rejected");
                }
            }
            store
        })
    }

    /// Store with the built-in datums plus every `<name>.txt` record in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> PlannerResult<Self> {
        let mut store = DatumStore::builtin().clone();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let text = fs::read_to_string(&path)?;
            store.insert_records(name, &text)?;
        }
        Ok(store)
    }

    /// Parses and registers one datum record, replacing any previous entry.
    pub fn insert_records(&mut self, name: &str, text: &str) -> PlannerResult<()> {
        let datum = Datum::parse(name, text)?;
        debug!(datum = name, squares = datum.grid.len(), "loaded datum");
        self.datums.insert(name.to_string(), datum);
        Ok(())
    }

    pub fn get(&self, name: &str) -> PlannerResult<&Datum> {
        self.datums.get(name).ok_or_else(|| PlannerError::datum(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datums.keys().map(String::as_str)
    }
}
