//! Error taxonomy shared by every planner component.

use std::time::Duration;

use thiserror::Error;

/// Result alias used across the crate.
pub type PlannerResult<T> = Result<T, PlannerError>;

#[derive(Debug, Error)]
pub enum PlannerError {
    /// Input matched no recognised notation and could not be geocoded.
    #[error("unrecognised location {input:?}: {reason}")]
    Format { input: String, reason: String },

    /// A datum name or grid-square prefix is absent from the store.
    #[error("unknown {kind} {key:?}")]
    DatumLookup { kind: &'static str, key: String },

    /// A datum record could not be parsed.
    #[error("malformed datum record for {datum:?} at line {line}: {reason}")]
    DatumRecord {
        datum: String,
        line: usize,
        reason: String,
    },

    #[error("{transform} did not converge within {iterations} iterations")]
    Convergence {
        transform: &'static str,
        iterations: usize,
    },

    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("{axis} {value} outside [{min}, {max}]")]
    CoordinateOutOfRange {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("exhaustive search over {locations} locations exceeds the limit of {limit}")]
    SearchTooLarge { locations: usize, limit: usize },

    #[error("exhaustive search exceeded its time budget after {elapsed:?}")]
    SearchTimedOut { elapsed: Duration },

    #[error("transport mode {0} is not supported by this provider")]
    UnsupportedMode(String),

    /// A remote collaborator answered, but not usefully.
    #[error("provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlannerError {
    pub(crate) fn datum(name: &str) -> Self {
        PlannerError::DatumLookup {
            kind: "datum",
            key: name.to_string(),
        }
    }

    pub(crate) fn grid_square(code: &str) -> Self {
        PlannerError::DatumLookup {
            kind: "grid square",
            key: code.to_string(),
        }
    }

    pub(crate) fn format(input: &str, reason: impl Into<String>) -> Self {
        PlannerError::Format {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
