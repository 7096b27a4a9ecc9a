//! Plot data extraction and axis mapping.
//!
//! egui_plot draws every series in one coordinate space, so secondary
//! series (growth rate, unemployment rate) are linearly mapped onto the
//! primary value range and their axes report true values through an
//! inverse-mapped formatter. This is how the dual- and triple-axis
//! overlays stay legible on one plot.

use egui_plot::{AxisHints, BoxElem, BoxSpread};
use polars::prelude::*;

use crate::calendar::{Quarter, from_epoch_days, to_epoch_days};
use crate::error::{PrepError, Result};
use crate::pipeline::outliers::{interpolated_quantile, iqr_bounds};
use crate::types::PERIOD_COL;

/// Linear map between a source value range and a destination plot range.
///
/// `Copy` so it can move into `'static` axis formatter closures.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AxisMap {
    src_min: f64,
    src_span: f64,
    dst_min: f64,
    dst_span: f64,
}

impl AxisMap {
    pub(crate) fn fit(src: (f64, f64), dst: (f64, f64)) -> Self {
        let src_span = src.1 - src.0;
        Self {
            src_min: src.0,
            // degenerate ranges map everything to the destination midpoint
            src_span: if src_span.abs() < f64::EPSILON {
                1.0
            } else {
                src_span
            },
            dst_min: dst.0,
            dst_span: dst.1 - dst.0,
        }
    }

    pub(crate) fn apply(&self, value: f64) -> f64 {
        self.dst_min + (value - self.src_min) / self.src_span * self.dst_span
    }

    pub(crate) fn invert(&self, plotted: f64) -> f64 {
        self.src_min + (plotted - self.dst_min) / self.dst_span * self.src_span
    }
}

/// (period epoch-days, value) points of a numeric column, null rows
/// skipped.
pub(crate) fn series_points(df: &DataFrame, column: &str) -> Result<Vec<[f64; 2]>> {
    let period = df
        .column(PERIOD_COL)
        .map_err(|_| PrepError::ColumnMissing {
            table: "aligned".to_string(),
            column: PERIOD_COL.to_string(),
        })?
        .as_materialized_series();
    let physical = period.to_physical_repr();
    let days = physical.i32()?;

    let series = df
        .column(column)
        .map_err(|_| PrepError::ColumnMissing {
            table: "aligned".to_string(),
            column: column.to_string(),
        })?
        .as_materialized_series();
    let floats = series.cast(&DataType::Float64)?;
    let values = floats.f64()?;

    Ok(days
        .into_iter()
        .zip(values)
        .filter_map(|(day, value)| Some([day? as f64, value?]))
        .collect())
}

/// The y-range of a point series, padded so lines do not hug the frame.
pub(crate) fn padded_range(points: &[[f64; 2]]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 1.0);
    }
    let min = points.iter().map(|p| p[1]).fold(f64::INFINITY, f64::min);
    let max = points
        .iter()
        .map(|p| p[1])
        .fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return (min - 0.5, max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

/// X axis rendering epoch-day marks as quarter labels.
pub(crate) fn quarter_axis() -> AxisHints<'static> {
    AxisHints::new_x()
        .label("Quarter")
        .formatter(|grid_mark, _range| {
            from_epoch_days(grid_mark.value.round() as i32)
                .map(|date| Quarter::from_date(date).label())
                .unwrap_or_default()
        })
}

/// A box-and-whisker element for a sorted value set: interpolated
/// quartiles, whiskers at the most extreme values inside the IQR fences.
pub(crate) fn box_elem(x: f64, sorted: &[f64]) -> BoxElem {
    let (q1, q3, lower_fence, upper_fence) = iqr_bounds(sorted);
    let median = interpolated_quantile(sorted, 0.5);

    let lower_whisker = sorted
        .iter()
        .copied()
        .filter(|v| *v >= lower_fence)
        .fold(f64::INFINITY, f64::min);
    let upper_whisker = sorted
        .iter()
        .copied()
        .filter(|v| *v <= upper_fence)
        .fold(f64::NEG_INFINITY, f64::max);

    BoxElem::new(x, BoxSpread::new(lower_whisker, q1, median, q3, upper_whisker))
}

/// Sorted non-null values of a column, for distribution charts.
pub(crate) fn sorted_values(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let series = df
        .column(column)
        .map_err(|_| PrepError::ColumnMissing {
            table: "aligned".to_string(),
            column: column.to_string(),
        })?
        .as_materialized_series();
    let floats = series.cast(&DataType::Float64)?;
    let mut values: Vec<f64> = floats.f64()?.into_iter().flatten().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    Ok(values)
}

/// Epoch-day x value for a date, exposed for tests.
#[allow(dead_code)]
pub(crate) fn x_for(date: chrono::NaiveDate) -> f64 {
    to_epoch_days(date) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QUARTER_COL, REGION_VALUE_COL};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn aligned_frame() -> DataFrame {
        let days: Vec<i32> = [
            NaiveDate::from_ymd_opt(1995, 3, 31).unwrap(),
            NaiveDate::from_ymd_opt(1995, 6, 30).unwrap(),
        ]
        .iter()
        .map(|d| to_epoch_days(*d))
        .collect();

        let period = Int32Chunked::from_vec(PERIOD_COL.into(), days)
            .into_date()
            .into_series();

        DataFrame::new(vec![
            Series::new(QUARTER_COL.into(), vec!["1995 Q1", "1995 Q2"]).into_column(),
            period.into_column(),
            Series::new(REGION_VALUE_COL.into(), vec![100.0, 110.0]).into_column(),
        ])
        .unwrap()
    }

    #[test]
    fn test_axis_map_round_trip() {
        let map = AxisMap::fit((0.0, 10.0), (50.0, 150.0));
        assert_eq!(map.apply(0.0), 50.0);
        assert_eq!(map.apply(10.0), 150.0);
        assert_eq!(map.apply(5.0), 100.0);
        assert!((map.invert(map.apply(3.7)) - 3.7).abs() < 1e-9);
    }

    #[test]
    fn test_axis_map_degenerate_source() {
        let map = AxisMap::fit((5.0, 5.0), (0.0, 100.0));
        // must not divide by zero
        assert!(map.apply(5.0).is_finite());
    }

    #[test]
    fn test_series_points_uses_period_days() {
        let df = aligned_frame();
        let points = series_points(&df, REGION_VALUE_COL).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0][1], 100.0);
        assert_eq!(
            points[0][0],
            x_for(NaiveDate::from_ymd_opt(1995, 3, 31).unwrap())
        );
    }

    #[test]
    fn test_padded_range() {
        let points = vec![[0.0, 10.0], [1.0, 20.0]];
        let (min, max) = padded_range(&points);
        assert!(min < 10.0 && max > 20.0);

        let flat = vec![[0.0, 5.0]];
        let (min, max) = padded_range(&flat);
        assert!(min < max);
    }

    #[test]
    fn test_box_elem_whiskers_inside_fences() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 100.0];
        let elem = box_elem(0.5, &sorted);
        // the 100.0 outlier sits past the upper fence, whisker stops at 4.0
        assert_eq!(elem.spread.upper_whisker, 4.0);
        assert_eq!(elem.spread.lower_whisker, 1.0);
    }
}
