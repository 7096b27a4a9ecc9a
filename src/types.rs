//! Core table types and the canonical column schema.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Synthetic quarter-label column, ordered first in every cleaned table.
pub const QUARTER_COL: &str = "Quarter";

/// Parsed period date column (quarter-end for housing, first day of the
/// quarter-end month for unemployment).
pub const PERIOD_COL: &str = "Period";

pub const REGION_VALUE_COL: &str = "region_value";
pub const REGION_GROWTH_COL: &str = "region_growth";
pub const NATIONAL_VALUE_COL: &str = "national_value";
pub const NATIONAL_GROWTH_COL: &str = "national_growth";

/// Canonical flat schema assigned positionally to the housing sheet:
/// the month column followed by value and annual-growth columns for the
/// region and the national series.
pub const HOUSING_RAW_COLUMNS: [&str; 5] = [
    "Month",
    REGION_VALUE_COL,
    REGION_GROWTH_COL,
    NATIONAL_VALUE_COL,
    NATIONAL_GROWTH_COL,
];

/// The two cleaned series restricted to a shared quarter range.
///
/// Both tables are ordered by ascending quarter and carry the synthetic
/// [`QUARTER_COL`] label first and the parsed [`PERIOD_COL`] date second.
#[derive(Debug, Clone)]
pub struct AlignedDataset {
    pub housing: DataFrame,
    pub unemployment: DataFrame,
}

impl AlignedDataset {
    /// Quarter labels of a cleaned table, in row order.
    pub fn quarter_labels(df: &DataFrame) -> Result<Vec<String>> {
        let series = df
            .column(QUARTER_COL)
            .map_err(|_| PrepError::ColumnMissing {
                table: "aligned".to_string(),
                column: QUARTER_COL.to_string(),
            })?
            .as_materialized_series()
            .clone();
        let labels = series.str()?;
        Ok(labels
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect())
    }
}

/// Human-readable summary of what a pipeline run did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Monthly housing rows as loaded.
    pub housing_rows_in: usize,
    /// Quarterly housing rows after cleaning and alignment.
    pub housing_rows_out: usize,

    /// Unemployment rows as loaded.
    pub unemployment_rows_in: usize,
    /// Unemployment rows after cleaning and alignment.
    pub unemployment_rows_out: usize,

    /// Actions taken during the run, in order.
    pub actions: Vec<String>,

    /// Warnings generated during the run.
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub fn add_action(&mut self, action: impl Into<String>) {
        self.actions.push(action.into());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Everything a pipeline run produces, besides the output workbook itself.
#[derive(Debug)]
pub struct RunResult {
    /// The cleaned, aligned pair of tables (also written to the output
    /// workbook).
    pub dataset: AlignedDataset,
    /// Diagnostic outlier reports; never fed back into the dataset.
    pub outliers: Vec<crate::pipeline::OutlierReport>,
    /// Initial-understanding profiles of the raw tables.
    pub profiles: Vec<crate::profiler::TableProfile>,
    /// Row counts, actions and timing.
    pub summary: RunSummary,
}
