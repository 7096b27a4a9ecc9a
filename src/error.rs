//! Error types for the preparation pipeline.
//!
//! Structural failures (missing sheet, missing column, unwritable output)
//! are fatal and surfaced immediately; there is no retry concept in a
//! single interactive run. Per-row date parse failures are not errors at
//! all: they become null markers and the rows are pruned during cleaning.

use thiserror::Error;

/// The main error type for the preparation pipeline.
#[derive(Error, Debug)]
pub enum PrepError {
    /// The input workbook does not contain the requested sheet.
    #[error("Sheet '{sheet}' not found in workbook '{path}'")]
    SheetNotFound { sheet: String, path: String },

    /// The sheet contains no data rows after skipping metadata and headers.
    #[error("Sheet '{0}' has no data rows")]
    EmptySheet(String),

    /// A required column is absent from a table.
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnMissing { table: String, column: String },

    /// The sheet width does not match the expected column layout.
    #[error("Sheet '{sheet}' has {found} columns, expected {expected}")]
    ColumnCountMismatch {
        sheet: String,
        expected: usize,
        found: usize,
    },

    /// No non-null values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigValidationError),

    /// Workbook read error.
    #[error("Workbook read error: {0}")]
    Workbook(#[from] calamine::Error),

    /// Workbook write error.
    #[error("Workbook write error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    /// Chart window error.
    #[error("Chart window error: {0}")]
    Chart(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PrepError>,
    },
}

impl PrepError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PrepError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PrepError::Polars(e).with_context(context))
    }
}
