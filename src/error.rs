// ⚠️ Error Types - Schema projection and configuration failures
//
// The analytic computations never fail; only the steps that check a dataset's
// shape (or load configuration) report errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Duplicate column in header: {0}")]
    DuplicateColumn(String),

    #[error("Row {row} does not match the header: {reason}")]
    RowShapeMismatch { row: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for dataset and configuration operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
