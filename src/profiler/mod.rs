//! Initial-understanding profiles of the raw tables.
//!
//! Before any cleaning happens, each loaded table gets a summary of its
//! shape, per-column null counts and descriptive statistics. Printed at
//! the start of a run so the analyst can sanity-check the load.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::utils::is_numeric_dtype;

/// Per-column summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    pub null_percentage: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

/// Summary of one loaded table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableProfile {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub column_summaries: Vec<ColumnSummary>,
}

/// Profile a table: shape, per-column dtypes, null counts, and numeric
/// descriptive statistics.
pub fn profile_table(df: &DataFrame, name: &str) -> Result<TableProfile> {
    let rows = df.height();
    let mut column_summaries = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let null_count = series.null_count();
        let null_percentage = if rows > 0 {
            null_count as f64 / rows as f64 * 100.0
        } else {
            0.0
        };

        let stats = if is_numeric_dtype(series.dtype()) {
            let floats = series.cast(&DataType::Float64)?;
            let values: Vec<f64> = floats.f64()?.into_iter().flatten().collect();
            numeric_stats(&values)
        } else {
            (None, None, None, None)
        };

        column_summaries.push(ColumnSummary {
            name: column.name().to_string(),
            dtype: series.dtype().to_string(),
            null_count,
            null_percentage,
            min: stats.0,
            max: stats.1,
            mean: stats.2,
            std: stats.3,
        });
    }

    Ok(TableProfile {
        name: name.to_string(),
        rows,
        columns: df.width(),
        column_summaries,
    })
}

/// (min, max, mean, sample std) of a slice of non-null values.
fn numeric_stats(values: &[f64]) -> (Option<f64>, Option<f64>, Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None, None, None);
    }

    let n = values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / n;

    let std = if values.len() > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    } else {
        Some(0.0)
    };

    (Some(min), Some(max), Some(mean), std)
}

impl fmt::Display for TableProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} rows x {} columns)", self.name, self.rows, self.columns)?;
        writeln!(
            f,
            "{:<24} {:<10} {:>8} {:>10} {:>12} {:>12} {:>12}",
            "Column", "Type", "Nulls", "Null %", "Min", "Mean", "Max"
        )?;
        writeln!(f, "{}", "-".repeat(94))?;
        for col in &self.column_summaries {
            writeln!(
                f,
                "{:<24} {:<10} {:>8} {:>10.1} {:>12} {:>12} {:>12}",
                col.name,
                col.dtype,
                col.null_count,
                col.null_percentage,
                fmt_stat(col.min),
                fmt_stat(col.mean),
                fmt_stat(col.max),
            )?;
        }
        Ok(())
    }
}

fn fmt_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile_counts_nulls() {
        let df = df![
            "Quarter" => ["a", "b", "c", "d"],
            "rate" => [Some(1.0), None, Some(3.0), None],
        ]
        .unwrap();

        let profile = profile_table(&df, "unemployment").unwrap();
        assert_eq!(profile.rows, 4);
        assert_eq!(profile.columns, 2);

        let rate = &profile.column_summaries[1];
        assert_eq!(rate.null_count, 2);
        assert_eq!(rate.null_percentage, 50.0);
    }

    #[test]
    fn test_profile_numeric_stats() {
        let df = df!["value" => [1.0, 2.0, 3.0, 4.0, 5.0]].unwrap();
        let profile = profile_table(&df, "t").unwrap();

        let col = &profile.column_summaries[0];
        assert_eq!(col.min, Some(1.0));
        assert_eq!(col.max, Some(5.0));
        assert_eq!(col.mean, Some(3.0));
        // sample std of 1..5 is sqrt(2.5)
        assert!((col.std.unwrap() - 2.5f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_profile_string_column_has_no_stats() {
        let df = df!["label" => ["x", "y"]].unwrap();
        let profile = profile_table(&df, "t").unwrap();

        let col = &profile.column_summaries[0];
        assert_eq!(col.min, None);
        assert_eq!(col.std, None);
    }

    #[test]
    fn test_profile_display_renders_table() {
        let df = df!["value" => [1.0, 2.0]].unwrap();
        let profile = profile_table(&df, "housing").unwrap();
        let text = profile.to_string();
        assert!(text.contains("housing (2 rows x 1 columns)"));
        assert!(text.contains("value"));
    }
}
