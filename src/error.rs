//! Error types for RFM model construction, fitting, and data loading.
//!
//! Every failure mode has a named variant; nothing is stringly-typed at the
//! library boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RfmError {
    /// Weight vector rejected at construction time.
    #[error("invalid weights {0:?}: expected 3 non-negative values summing to exactly 1")]
    InvalidWeights([f64; 3]),

    /// Unknown value for a closed parameter such as `dataset_type`.
    #[error("invalid value '{value}' for {name}: expected one of {expected}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Wrong column count for the declared dataset type.
    #[error("expected {expected} columns for {dataset_type} data, received {actual}")]
    ShapeMismatch {
        dataset_type: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A date failed every accepted format.
    #[error("unparseable date '{0}': accepted formats are MM/DD/YYYY, MM-DD-YYYY, DD-Mon-YY")]
    DateParse(String),

    /// Unrecognized binning strategy name.
    #[error("unrecognized scoring strategy '{0}': expected mean, median, or quintile")]
    InvalidStrategy(String),

    /// Structurally unusable input (short rows, non-numeric fields, empty columns).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Accessor called before a successful `fit`.
    #[error("model has not been fitted")]
    NotFitted,

    /// CSV reader/writer failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias used throughout the library.
pub type Result<T> = std::result::Result<T, RfmError>;
