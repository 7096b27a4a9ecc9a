//! The preparation pipeline.
//!
//! One run is a single sequential pass: load both sheets, profile them,
//! clean and align to a shared quarterly range, scan for outliers, and
//! export the result. Every stage consumes its input table and produces a
//! new one; nothing is mutated across stage boundaries.

pub mod align;
pub mod outliers;

pub use outliers::{FlaggedRow, OutlierReport, detect_outliers};

use polars::prelude::*;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::{ConfigValidationError, PrepConfig};
use crate::error::{PrepError, Result};
use crate::profiler::profile_table;
use crate::types::{HOUSING_RAW_COLUMNS, REGION_VALUE_COL, RunResult, RunSummary};
use crate::workbook::{WorkbookReader, write_workbook};

/// The preparation pipeline for one workbook.
///
/// # Example
///
/// ```rust,ignore
/// use quarterline::{Pipeline, PrepConfig};
///
/// let config = PrepConfig::builder()
///     .input_path("dataset.xlsx")
///     .output_path("dataset_prepared.xlsx")
///     .build()?;
///
/// let result = Pipeline::new(config)?.run()?;
/// println!("{} aligned quarters", result.dataset.housing.height());
/// ```
pub struct Pipeline {
    config: PrepConfig,
}

impl Pipeline {
    /// Create a pipeline from a configuration, validating it first.
    pub fn new(config: PrepConfig) -> std::result::Result<Self, ConfigValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Load both raw tables from the input workbook.
    ///
    /// The housing sheet gets the canonical flat schema assigned
    /// positionally; the unemployment sheet keeps its own header labels
    /// but must contain the configured region column.
    pub fn load(&self) -> Result<(DataFrame, DataFrame)> {
        let mut reader = WorkbookReader::open(&self.config.input_path)?;

        let rename: Vec<&str> = HOUSING_RAW_COLUMNS.to_vec();
        let housing = reader.read_sheet(&self.config.housing_sheet, Some(&rename))?;
        let unemployment = reader.read_sheet(&self.config.unemployment_sheet, None)?;

        if unemployment.column(&self.config.region).is_err() {
            return Err(PrepError::ColumnMissing {
                table: self.config.unemployment_sheet.name.clone(),
                column: self.config.region.clone(),
            });
        }

        Ok((housing, unemployment))
    }

    /// Run the full pipeline: load, profile, clean, align, scan for
    /// outliers, export.
    pub fn run(&self) -> Result<RunResult> {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        info!(
            "Loading workbook '{}'",
            self.config.input_path.display()
        );
        let (housing_raw, unemployment_raw) = self.load()?;
        summary.housing_rows_in = housing_raw.height();
        summary.unemployment_rows_in = unemployment_raw.height();
        summary.add_action(format!(
            "Loaded {} housing rows and {} unemployment rows",
            housing_raw.height(),
            unemployment_raw.height()
        ));

        info!("Profiling raw tables");
        let profiles = vec![
            profile_table(&housing_raw, &self.config.housing_sheet.name)?,
            profile_table(&unemployment_raw, &self.config.unemployment_sheet.name)?,
        ];

        let window = self.config.window();
        info!("Cleaning and aligning to quarter window {window}");

        let housing = align::resample_housing(&housing_raw, window)?;
        summary.add_action(format!(
            "Resampled housing data to {} quarterly rows",
            housing.height()
        ));

        let unemployment = align::clean_unemployment(&unemployment_raw, window)?;
        summary.add_action(format!(
            "Cleaned unemployment data to {} quarterly rows",
            unemployment.height()
        ));

        let dataset = align::intersect(housing, unemployment)?;
        summary.housing_rows_out = dataset.housing.height();
        summary.unemployment_rows_out = dataset.unemployment.height();
        summary.add_action(format!(
            "Aligned both series to {} shared quarters",
            dataset.housing.height()
        ));

        if dataset.housing.height() == 0 || dataset.unemployment.height() == 0 {
            summary.add_warning(
                "No overlapping quarters between the two series within the date range".to_string(),
            );
            warn!("Aligned dataset is empty");
        }

        info!("Scanning for outliers");
        let mut outlier_reports = Vec::new();
        if dataset.housing.height() > 0 {
            outlier_reports.push(detect_outliers(
                &dataset.housing,
                &self.config.housing_sheet.name,
                REGION_VALUE_COL,
            )?);
        }
        if dataset.unemployment.height() > 0 {
            outlier_reports.push(detect_outliers(
                &dataset.unemployment,
                &self.config.unemployment_sheet.name,
                &self.config.region,
            )?);
        }
        for report in &outlier_reports {
            summary.add_action(format!(
                "Flagged {} outlier(s) in {}.{}",
                report.len(),
                report.table,
                report.column
            ));
        }

        info!(
            "Writing cleaned tables to '{}'",
            self.config.output_path.display()
        );
        write_workbook(
            &self.config.output_path,
            &[
                (&self.config.housing_output_sheet, &dataset.housing),
                (&self.config.unemployment_output_sheet, &dataset.unemployment),
            ],
        )?;
        summary.add_action(format!(
            "Wrote '{}' and '{}' sheets to {}",
            self.config.housing_output_sheet,
            self.config.unemployment_output_sheet,
            self.config.output_path.display()
        ));

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        info!("Pipeline finished in {}ms", summary.duration_ms);

        Ok(RunResult {
            dataset,
            outliers: outlier_reports,
            profiles,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_rejects_invalid_config() {
        let config = PrepConfig {
            region: "  ".to_string(),
            ..PrepConfig::default()
        };
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn test_pipeline_missing_input_fails() {
        let config = PrepConfig::builder()
            .input_path("definitely-missing.xlsx")
            .output_path(std::env::temp_dir().join("quarterline_unused.xlsx"))
            .build()
            .unwrap();

        let pipeline = Pipeline::new(config).unwrap();
        assert!(pipeline.run().is_err());
    }
}
