//! Quarterly cleaning and alignment.
//!
//! Every function takes a table and produces a new table: the monthly
//! housing series is resampled to quarterly means, the unemployment series
//! has its free-text quarter labels parsed to dates, and both are
//! restricted to the configured quarter window and finally to the
//! intersection of their observed ranges.

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use crate::calendar::{
    Quarter, QuarterWindow, from_epoch_days, parse_period, parse_quarter_label, to_epoch_days,
};
use crate::error::{PrepError, Result};
use crate::types::{AlignedDataset, PERIOD_COL, QUARTER_COL};

/// Build the `Quarter` label and `Period` date columns for a set of dates.
fn period_columns(dates: &[NaiveDate]) -> Vec<Column> {
    let labels: Vec<String> = dates
        .iter()
        .map(|date| Quarter::from_date(*date).label())
        .collect();
    let days: Vec<i32> = dates.iter().map(|date| to_epoch_days(*date)).collect();

    vec![
        Series::new(QUARTER_COL.into(), labels).into_column(),
        Int32Chunked::from_vec(PERIOD_COL.into(), days)
            .into_date()
            .into_series()
            .into_column(),
    ]
}

/// The period strings of a raw table's first column, parsed to dates with
/// the given rule. Unparseable entries are `None`.
fn parsed_periods(
    df: &DataFrame,
    parse: impl Fn(&str) -> Option<NaiveDate>,
) -> Result<Vec<Option<NaiveDate>>> {
    let first = df
        .get_columns()
        .first()
        .ok_or_else(|| PrepError::EmptySheet("<unnamed>".to_string()))?;
    let series = first.as_materialized_series();
    let labels = series.str()?;
    Ok(labels
        .into_iter()
        .map(|value| value.and_then(|raw| parse(raw)))
        .collect())
}

/// The nullable float values of every column after the first.
fn value_columns(df: &DataFrame) -> Result<Vec<(String, Vec<Option<f64>>)>> {
    let mut columns = Vec::with_capacity(df.width().saturating_sub(1));
    for column in df.get_columns().iter().skip(1) {
        let series = column.as_materialized_series();
        let floats = series.cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = floats.f64()?.into_iter().collect();
        columns.push((column.name().to_string(), values));
    }
    Ok(columns)
}

/// Resample the monthly housing table to quarterly means.
///
/// Rows are grouped by the quarter of their parsed month; each quarter's
/// value per column is the arithmetic mean of the non-null monthly values
/// falling in it. Rows with unparseable dates are ignored. Quarters
/// outside the window, or with a null mean in any column, are dropped.
/// The output carries the synthetic `Quarter` label first, the quarter-end
/// `Period` date second, and is ordered by ascending quarter.
pub fn resample_housing(df: &DataFrame, window: QuarterWindow) -> Result<DataFrame> {
    let dates = parsed_periods(df, parse_period)?;
    let values = value_columns(df)?;
    let value_count = values.len();

    // (sum, count) accumulator per quarter per value column
    let mut buckets: BTreeMap<Quarter, Vec<(f64, usize)>> = BTreeMap::new();
    for (row_idx, date) in dates.iter().enumerate() {
        let Some(date) = date else { continue };
        let bucket = buckets
            .entry(Quarter::from_date(*date))
            .or_insert_with(|| vec![(0.0, 0); value_count]);
        for (col_idx, (_, column)) in values.iter().enumerate() {
            if let Some(value) = column[row_idx] {
                bucket[col_idx].0 += value;
                bucket[col_idx].1 += 1;
            }
        }
    }

    let mut kept_dates: Vec<NaiveDate> = Vec::new();
    let mut means: Vec<Vec<f64>> = vec![Vec::new(); value_count];
    for (quarter, accumulators) in &buckets {
        if !window.contains(*quarter) {
            continue;
        }
        let quarter_means: Vec<Option<f64>> = accumulators
            .iter()
            .map(|(sum, count)| (*count > 0).then(|| sum / *count as f64))
            .collect();
        if quarter_means.iter().any(|mean| mean.is_none()) {
            debug!("Dropping {} from housing: null quarterly mean", quarter);
            continue;
        }
        kept_dates.push(quarter.end_date());
        for (col_idx, mean) in quarter_means.into_iter().enumerate() {
            means[col_idx].push(mean.unwrap_or_default());
        }
    }

    let mut columns = period_columns(&kept_dates);
    for ((name, _), column_means) in values.iter().zip(means) {
        columns.push(Series::new(name.as_str().into(), column_means).into_column());
    }

    let out = DataFrame::new(columns)?;
    debug!(
        "Resampled housing: {} monthly rows -> {} quarters",
        df.height(),
        out.height()
    );
    Ok(out)
}

/// Clean the quarterly unemployment table.
///
/// Free-text quarter labels are parsed with the last-hyphen rule; rows
/// with an unparseable label, a quarter outside the window, or any null
/// rate are dropped. The output carries the synthetic `Quarter` label
/// first, the parsed `Period` date second, and is ordered by ascending
/// quarter.
pub fn clean_unemployment(df: &DataFrame, window: QuarterWindow) -> Result<DataFrame> {
    let dates = parsed_periods(df, parse_quarter_label)?;
    let values = value_columns(df)?;

    let mut kept: Vec<(NaiveDate, usize)> = dates
        .iter()
        .enumerate()
        .filter_map(|(row_idx, date)| {
            let date = (*date)?;
            if !window.contains_date(date) {
                return None;
            }
            let complete = values.iter().all(|(_, column)| column[row_idx].is_some());
            complete.then_some((date, row_idx))
        })
        .collect();
    kept.sort_by_key(|(date, _)| *date);

    let kept_dates: Vec<NaiveDate> = kept.iter().map(|(date, _)| *date).collect();
    let mut columns = period_columns(&kept_dates);
    for (name, column) in &values {
        let rates: Vec<f64> = kept
            .iter()
            .map(|(_, row_idx)| column[*row_idx].unwrap_or_default())
            .collect();
        columns.push(Series::new(name.as_str().into(), rates).into_column());
    }

    let out = DataFrame::new(columns)?;
    debug!(
        "Cleaned unemployment: {} rows -> {} quarters",
        df.height(),
        out.height()
    );
    Ok(out)
}

/// The quarters of a cleaned table's `Period` column, in row order.
fn period_quarters(df: &DataFrame) -> Result<Vec<Quarter>> {
    let series = df
        .column(PERIOD_COL)
        .map_err(|_| PrepError::ColumnMissing {
            table: "aligned".to_string(),
            column: PERIOD_COL.to_string(),
        })?
        .as_materialized_series();
    let physical = series.to_physical_repr();
    let days = physical.i32()?;
    Ok(days
        .into_iter()
        .flatten()
        .filter_map(from_epoch_days)
        .map(Quarter::from_date)
        .collect())
}

/// Restrict both cleaned tables to the intersection of their observed
/// quarter ranges.
///
/// After this, both tables share the same first and last quarter. If the
/// ranges do not overlap, both tables come back empty.
pub fn intersect(housing: DataFrame, unemployment: DataFrame) -> Result<AlignedDataset> {
    let housing_quarters = period_quarters(&housing)?;
    let unemployment_quarters = period_quarters(&unemployment)?;

    let bounds = match (
        housing_quarters.first().zip(housing_quarters.last()),
        unemployment_quarters
            .first()
            .zip(unemployment_quarters.last()),
    ) {
        (Some((h_first, h_last)), Some((u_first, u_last))) => {
            Some((*h_first.max(u_first), *h_last.min(u_last)))
        }
        _ => None,
    };

    let restrict = |df: DataFrame, quarters: &[Quarter]| -> Result<DataFrame> {
        let Some((start, end)) = bounds else {
            // one side is already empty; drop everything from the other
            let mask = BooleanChunked::from_slice("mask".into(), &vec![false; df.height()]);
            return Ok(df.filter(&mask)?);
        };
        let keep: Vec<bool> = quarters
            .iter()
            .map(|quarter| start <= *quarter && *quarter <= end)
            .collect();
        let mask = BooleanChunked::from_slice("mask".into(), &keep);
        Ok(df.filter(&mask)?)
    };

    let housing = restrict(housing, &housing_quarters)?;
    let unemployment = restrict(unemployment, &unemployment_quarters)?;

    debug!(
        "Aligned dataset: {} housing quarters, {} unemployment quarters",
        housing.height(),
        unemployment.height()
    );

    Ok(AlignedDataset {
        housing,
        unemployment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HOUSING_RAW_COLUMNS, REGION_VALUE_COL};
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn full_window() -> QuarterWindow {
        QuarterWindow::from_dates(date(1995, 3, 1), date(2023, 6, 1))
    }

    fn monthly_housing_1995() -> DataFrame {
        let months: Vec<String> = (1..=12).map(|m| format!("1995-{m:02}-01")).collect();
        let values: Vec<f64> = (1..=12).map(|m| m as f64 * 10.0).collect();
        let growth: Vec<f64> = (1..=12).map(|m| m as f64 * 0.1).collect();

        df![
            HOUSING_RAW_COLUMNS[0] => months,
            HOUSING_RAW_COLUMNS[1] => values.clone(),
            HOUSING_RAW_COLUMNS[2] => growth.clone(),
            HOUSING_RAW_COLUMNS[3] => values,
            HOUSING_RAW_COLUMNS[4] => growth,
        ]
        .unwrap()
    }

    // ==================== resample_housing tests ====================

    #[test]
    fn test_resample_monthly_to_quarterly_means() {
        let quarterly = resample_housing(&monthly_housing_1995(), full_window()).unwrap();

        assert_eq!(quarterly.height(), 4);
        let labels = AlignedDataset::quarter_labels(&quarterly).unwrap();
        assert_eq!(labels, vec!["1995 Q1", "1995 Q2", "1995 Q3", "1995 Q4"]);

        // Q1 mean of 10, 20, 30
        let series = quarterly
            .column(REGION_VALUE_COL)
            .unwrap()
            .as_materialized_series()
            .clone();
        let values = series.f64().unwrap();
        assert_eq!(values.get(0), Some(20.0));
        assert_eq!(values.get(3), Some(110.0));
    }

    #[test]
    fn test_resample_attaches_quarter_end_dates() {
        let quarterly = resample_housing(&monthly_housing_1995(), full_window()).unwrap();
        let quarters = period_quarters(&quarterly).unwrap();
        assert_eq!(quarters[0], Quarter::new(1995, 1));

        let names: Vec<String> = quarterly
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names[0], QUARTER_COL);
        assert_eq!(names[1], PERIOD_COL);
    }

    #[test]
    fn test_resample_already_quarterly_is_identity() {
        let df = df![
            "Month" => ["1995-03-31", "1995-06-30", "1995-09-30"],
            REGION_VALUE_COL => [100.0, 110.0, 120.0],
        ]
        .unwrap();

        let quarterly = resample_housing(&df, full_window()).unwrap();
        assert_eq!(quarterly.height(), 3);

        let series = quarterly
            .column(REGION_VALUE_COL)
            .unwrap()
            .as_materialized_series()
            .clone();
        let values = series.f64().unwrap();
        assert_eq!(values.get(0), Some(100.0));
        assert_eq!(values.get(1), Some(110.0));
        assert_eq!(values.get(2), Some(120.0));
    }

    #[test]
    fn test_resample_ignores_unparseable_dates() {
        let df = df![
            "Month" => ["1995-01-01", "not a date", "1995-02-01"],
            REGION_VALUE_COL => [10.0, 999.0, 20.0],
        ]
        .unwrap();

        let quarterly = resample_housing(&df, full_window()).unwrap();
        assert_eq!(quarterly.height(), 1);

        let series = quarterly
            .column(REGION_VALUE_COL)
            .unwrap()
            .as_materialized_series()
            .clone();
        assert_eq!(series.f64().unwrap().get(0), Some(15.0));
    }

    #[test]
    fn test_resample_skips_null_values_in_mean() {
        let df = df![
            "Month" => ["1995-01-01", "1995-02-01", "1995-03-01"],
            REGION_VALUE_COL => [Some(10.0), None, Some(20.0)],
        ]
        .unwrap();

        let quarterly = resample_housing(&df, full_window()).unwrap();
        let series = quarterly
            .column(REGION_VALUE_COL)
            .unwrap()
            .as_materialized_series()
            .clone();
        assert_eq!(series.f64().unwrap().get(0), Some(15.0));
    }

    #[test]
    fn test_resample_drops_quarters_outside_window() {
        let df = df![
            "Month" => ["1994-11-01", "1995-03-15", "2023-06-15", "2023-08-01"],
            REGION_VALUE_COL => [1.0, 2.0, 3.0, 4.0],
        ]
        .unwrap();

        let quarterly = resample_housing(&df, full_window()).unwrap();
        let labels = AlignedDataset::quarter_labels(&quarterly).unwrap();
        assert_eq!(labels, vec!["1995 Q1", "2023 Q2"]);
    }

    // ==================== clean_unemployment tests ====================

    fn unemployment_1995() -> DataFrame {
        df![
            "Quarter" => ["Jan-Mar 1995", "Apr-Jun 1995", "Jul-Sep 1995", "Oct-Dec 1995"],
            "London" => [8.0, 7.9, 7.8, 7.7],
            "North East" => [10.0, 10.1, 10.2, 10.3],
        ]
        .unwrap()
    }

    #[test]
    fn test_clean_unemployment_parses_labels() {
        let clean = clean_unemployment(&unemployment_1995(), full_window()).unwrap();

        assert_eq!(clean.height(), 4);
        let labels = AlignedDataset::quarter_labels(&clean).unwrap();
        assert_eq!(labels, vec!["1995 Q1", "1995 Q2", "1995 Q3", "1995 Q4"]);

        let quarters = period_quarters(&clean).unwrap();
        assert_eq!(quarters[3], Quarter::new(1995, 4));
    }

    #[test]
    fn test_clean_unemployment_window_is_boundary_inclusive() {
        let df = df![
            "Quarter" => ["Oct-Dec 1994", "Jan-Mar 1995", "Apr-Jun 2023", "Jul-Sep 2023"],
            "London" => [9.0, 8.0, 4.0, 4.1],
        ]
        .unwrap();

        let clean = clean_unemployment(&df, full_window()).unwrap();
        let labels = AlignedDataset::quarter_labels(&clean).unwrap();
        assert_eq!(labels, vec!["1995 Q1", "2023 Q2"]);
    }

    #[test]
    fn test_clean_unemployment_drops_null_rows() {
        let df = df![
            "Quarter" => ["Jan-Mar 1995", "Apr-Jun 1995", "garbage"],
            "London" => [Some(8.0), None, Some(7.0)],
        ]
        .unwrap();

        let clean = clean_unemployment(&df, full_window()).unwrap();
        let labels = AlignedDataset::quarter_labels(&clean).unwrap();
        assert_eq!(labels, vec!["1995 Q1"]);
    }

    #[test]
    fn test_clean_unemployment_sorts_by_quarter() {
        let df = df![
            "Quarter" => ["Oct-Dec 1995", "Jan-Mar 1995", "Apr-Jun 1995"],
            "London" => [7.7, 8.0, 7.9],
        ]
        .unwrap();

        let clean = clean_unemployment(&df, full_window()).unwrap();
        let labels = AlignedDataset::quarter_labels(&clean).unwrap();
        assert_eq!(labels, vec!["1995 Q1", "1995 Q2", "1995 Q4"]);
    }

    // ==================== intersect tests ====================

    #[test]
    fn test_intersect_trims_to_shared_range() {
        let housing = df![
            "Month" => [
                "1995-01-01", "1995-02-01", "1995-03-01",
                "1995-04-01", "1995-05-01", "1995-06-01",
                "1995-07-01", "1995-08-01", "1995-09-01",
            ],
            REGION_VALUE_COL => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        ]
        .unwrap();
        let housing = resample_housing(&housing, full_window()).unwrap();

        let unemployment = df![
            "Quarter" => ["Apr-Jun 1995", "Jul-Sep 1995", "Oct-Dec 1995"],
            "London" => [7.9, 7.8, 7.7],
        ]
        .unwrap();
        let unemployment = clean_unemployment(&unemployment, full_window()).unwrap();

        let aligned = intersect(housing, unemployment).unwrap();

        let housing_labels = AlignedDataset::quarter_labels(&aligned.housing).unwrap();
        let unemployment_labels = AlignedDataset::quarter_labels(&aligned.unemployment).unwrap();
        assert_eq!(housing_labels, vec!["1995 Q2", "1995 Q3"]);
        assert_eq!(unemployment_labels, vec!["1995 Q2", "1995 Q3"]);
    }

    #[test]
    fn test_intersect_disjoint_ranges_yield_empty_tables() {
        let housing = df![
            "Month" => ["1995-01-01", "1995-02-01", "1995-03-01"],
            REGION_VALUE_COL => [1.0, 2.0, 3.0],
        ]
        .unwrap();
        let housing = resample_housing(&housing, full_window()).unwrap();

        let unemployment = df![
            "Quarter" => ["Jan-Mar 2000"],
            "London" => [6.0],
        ]
        .unwrap();
        let unemployment = clean_unemployment(&unemployment, full_window()).unwrap();

        let aligned = intersect(housing, unemployment).unwrap();
        assert_eq!(aligned.housing.height(), 0);
        assert_eq!(aligned.unemployment.height(), 0);
    }
}
