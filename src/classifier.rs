//! Syntactic classification of raw location strings.
//!
//! Patterns are tried in a fixed order: decimal pair, degree-minute-second
//! pair, grid reference, northing/easting pair. Every pattern is anchored to
//! the end of the (trimmed) input only, so leading text before a grid
//! reference is tolerated. The numeric patterns additionally refuse to
//! start in the middle of a number. No range validation happens here.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::geodesy::NorthingEasting;

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(-?\d{1,3}(?:\.\d+)?)°?\s*(,|\s)\s*(-?\d{1,3}(?:\.\d+)?)°?$")
        .expect("decimal pattern compiles")
});

static DEG_MIN_SEC: LazyLock<Regex> = LazyLock::new(|| {
    let axis = |hemispheres: &str| {
        format!(
            r#"(-?)(\d{{1,3}})\s*°\s*(\d{{1,2}})\s*['′]\s*(\d{{1,2}}(?:\.\d+)?)\s*(?:''|"|″)\s*([{hemispheres}])?"#
        )
    };
    Regex::new(&format!(
        r"(?:^|[^\d.]){}\s*[,\s]\s*{}$",
        axis("NSns"),
        axis("EWew")
    ))
    .expect("degree-minute-second pattern compiles")
});

static GRID_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z]{2})\s*(\d{2}\s*\d{2}|\d{3}\s*\d{3}|\d{4}\s*\d{4}|\d{5}\s*\d{5})$")
        .expect("grid reference pattern compiles")
});

static NORTHING_EASTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(\d+(?:\.\d+)?)\s*(?:,|\s)\s*(\d+(?:\.\d+)?)$")
        .expect("northing/easting pattern compiles")
});

/// One axis of a degree-minute-second coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub negative: bool,
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: f64,
}

impl Dms {
    /// `degrees + minutes/60 + seconds/3600`, negated for S/W or a leading minus.
    pub fn to_decimal(&self) -> f64 {
        let value = f64::from(self.degrees) + f64::from(self.minutes) / 60.0 + self.seconds / 3600.0;
        if self.negative { -value } else { value }
    }
}

/// Result of classifying a raw location string.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationFormat {
    Decimal { lat: f64, lon: f64 },
    DegMinSec { lat: Dms, lon: Dms },
    /// Compact form: upper-case square letters followed by the digits.
    GridRef(String),
    NorthingEasting(NorthingEasting),
    Unrecognized,
}

impl LocationFormat {
    pub fn name(&self) -> &'static str {
        match self {
            LocationFormat::Decimal { .. } => "decimal",
            LocationFormat::DegMinSec { .. } => "degree-minute-second",
            LocationFormat::GridRef(_) => "grid reference",
            LocationFormat::NorthingEasting(_) => "northing/easting",
            LocationFormat::Unrecognized => "unrecognized",
        }
    }
}

pub fn classify(raw: &str) -> LocationFormat {
    let input = raw.trim();
    decimal(input)
        .or_else(|| deg_min_sec(input))
        .or_else(|| grid_ref(input))
        .or_else(|| northing_easting(input))
        .unwrap_or(LocationFormat::Unrecognized)
}

fn decimal(input: &str) -> Option<LocationFormat> {
    let caps = DECIMAL.captures(input)?;
    let lat = &caps[1];
    let lon = &caps[3];
    // Bare integer pairs belong to the northing/easting notation.
    if !caps[0].contains('°') && !lat.contains('.') && !lon.contains('.') {
        return None;
    }
    Some(LocationFormat::Decimal {
        lat: lat.parse().ok()?,
        lon: lon.parse().ok()?,
    })
}

fn dms_axis(caps: &Captures<'_>, first: usize) -> Option<Dms> {
    let hemisphere = caps.get(first + 4).map(|m| m.as_str());
    let southern_or_western = matches!(hemisphere, Some("S" | "s" | "W" | "w"));
    Some(Dms {
        // A minus sign and an S/W letter say the same thing; they never cancel.
        negative: &caps[first] == "-" || southern_or_western,
        degrees: caps[first + 1].parse().ok()?,
        minutes: caps[first + 2].parse().ok()?,
        seconds: caps[first + 3].parse().ok()?,
    })
}

fn deg_min_sec(input: &str) -> Option<LocationFormat> {
    let caps = DEG_MIN_SEC.captures(input)?;
    Some(LocationFormat::DegMinSec {
        lat: dms_axis(&caps, 1)?,
        lon: dms_axis(&caps, 6)?,
    })
}

fn grid_ref(input: &str) -> Option<LocationFormat> {
    let caps = GRID_REF.captures(input)?;
    let digits: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
    Some(LocationFormat::GridRef(format!(
        "{}{}",
        caps[1].to_ascii_uppercase(),
        digits
    )))
}

fn northing_easting(input: &str) -> Option<LocationFormat> {
    let caps = NORTHING_EASTING.captures(input)?;
    Some(LocationFormat::NorthingEasting(NorthingEasting {
        easting: caps[1].parse().ok()?,
        northing: caps[2].parse().ok()?,
    }))
}
