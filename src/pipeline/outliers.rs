//! IQR outlier diagnostics.
//!
//! Flags rows whose value falls strictly outside
//! [Q1 − 1.5·IQR, Q3 + 1.5·IQR] for a column. The report is purely
//! diagnostic: it is printed and serialized but never used to filter the
//! dataset.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{PrepError, Result};
use crate::types::QUARTER_COL;

/// A row flagged by the IQR scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedRow {
    pub quarter: String,
    pub value: f64,
}

/// Outlier scan result for one column of one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierReport {
    pub table: String,
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub rows: Vec<FlaggedRow>,
}

impl OutlierReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

impl fmt::Display for OutlierReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}.{}: Q1={:.2} Q3={:.2} IQR={:.2} bounds=[{:.2}, {:.2}] -> {} outlier(s)",
            self.table,
            self.column,
            self.q1,
            self.q3,
            self.iqr,
            self.lower_bound,
            self.upper_bound,
            self.rows.len()
        )?;
        for row in &self.rows {
            writeln!(f, "  {}: {:.2}", row.quarter, row.value)?;
        }
        Ok(())
    }
}

/// Quantile of a sorted, non-empty slice using linear interpolation
/// (`h = (n − 1) · p`).
pub fn interpolated_quantile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let fraction = h - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * fraction
}

/// IQR fence bounds for a sorted, non-empty slice.
pub fn iqr_bounds(sorted: &[f64]) -> (f64, f64, f64, f64) {
    let q1 = interpolated_quantile(sorted, 0.25);
    let q3 = interpolated_quantile(sorted, 0.75);
    let iqr = q3 - q1;
    (q1, q3, q1 - 1.5 * iqr, q3 + 1.5 * iqr)
}

/// Scan one numeric column of a table for IQR outliers.
///
/// Null values are ignored for the quartile computation and can never be
/// flagged. A value exactly on a bound is not an outlier.
pub fn detect_outliers(df: &DataFrame, table: &str, column: &str) -> Result<OutlierReport> {
    let series = df
        .column(column)
        .map_err(|_| PrepError::ColumnMissing {
            table: table.to_string(),
            column: column.to_string(),
        })?
        .as_materialized_series();

    let floats = series.cast(&DataType::Float64)?;
    let values = floats.f64()?;

    let labels: Vec<String> = match df.column(QUARTER_COL) {
        Ok(col) => {
            let series = col.as_materialized_series();
            series
                .str()?
                .into_iter()
                .map(|v| v.unwrap_or_default().to_string())
                .collect()
        }
        Err(_) => (0..df.height()).map(|idx| format!("row {idx}")).collect(),
    };

    let mut sorted: Vec<f64> = values.into_iter().flatten().collect();
    if sorted.is_empty() {
        return Err(PrepError::NoValidValues(column.to_string()));
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let (q1, q3, lower_bound, upper_bound) = iqr_bounds(&sorted);

    let rows: Vec<FlaggedRow> = values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| {
            let value = value?;
            (value < lower_bound || value > upper_bound).then(|| FlaggedRow {
                quarter: labels.get(idx).cloned().unwrap_or_default(),
                value,
            })
        })
        .collect();

    debug!(
        "Outlier scan {}.{}: bounds [{:.3}, {:.3}], {} flagged",
        table,
        column,
        lower_bound,
        upper_bound,
        rows.len()
    );

    Ok(OutlierReport {
        table: table.to_string(),
        column: column.to_string(),
        q1,
        q3,
        iqr: q3 - q1,
        lower_bound,
        upper_bound,
        rows,
    })
}
