//! Error taxonomy for the analysis pipeline.
//!
//! Only conditions that stop an upload (or a request) are errors here.
//! Statistics that cannot be computed (zero variance, zero rows) are not
//! errors: the pipeline reports them as `None`.

use thiserror::Error;

/// All errors produced by the analysis pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The upload is not valid delimited text, or a cell could not be read.
    #[error("Malformed CSV: {0}")]
    MalformedCsv(String),

    /// A required column is absent after the rename map was applied.
    #[error("Missing column {missing}; expected {expected}")]
    MissingColumn { missing: String, expected: String },

    /// A time cell matched none of the accepted formats.
    #[error("Row {row}: cannot parse timestamp '{value}' (accepted formats: {formats})")]
    InvalidTimestamp {
        row: usize,
        value: String,
        formats: String,
    },

    /// A rolling window of zero rows was requested.
    #[error("Rolling window must be at least 1 row")]
    InvalidWindow,

    /// Serializing a table back to CSV failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<csv::Error> for PipelineError {
    fn from(e: csv::Error) -> Self {
        PipelineError::MalformedCsv(e.to_string())
    }
}

/// Convenience alias used throughout the pipeline modules.
pub type Result<T> = std::result::Result<T, PipelineError>;
