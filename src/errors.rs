//! Error types for netrisk
//!
//! Every variant is an input-contract violation: it is raised synchronously
//! and never retried. Mathematically undefined results (for example the
//! gradient of a zero score) are not errors; they travel inside the
//! [`MetricsBundle`](crate::models::MetricsBundle) as annotated values.

use thiserror::Error;

/// Errors raised by network construction, scenario mutation and the scenario store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Shape mismatch: {what} has {actual} entries, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid weight {value} at ({row}, {col}): {reason}")]
    InvalidWeight {
        row: usize,
        col: usize,
        value: f64,
        reason: &'static str,
    },

    #[error("Index {index} out of range for a network of {len} entities")]
    OutOfRange { index: usize, len: usize },

    #[error("{what} must be a finite non-negative number, got {value}")]
    NegativeValue { what: &'static str, value: f64 },

    #[error("Empty selection: {0}")]
    EmptySelection(&'static str),

    #[error("Entity '{0}' appears more than once")]
    DuplicateEntity(String),

    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("Scenario '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid scenario name: {0}")]
    InvalidName(&'static str),

    #[error("Unknown scenario '{0}'")]
    UnknownScenario(String),

    #[error("At least {min} scenarios are required for a comparison, got {actual}")]
    InsufficientSelection { min: usize, actual: usize },

    #[error("At most {max} scenarios can be compared at once, got {actual}")]
    TooManySelections { max: usize, actual: usize },
}

pub type RiskResult<T> = Result<T, RiskError>;
