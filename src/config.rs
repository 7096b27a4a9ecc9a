//! Configuration for the preparation pipeline.
//!
//! The source/destination paths and sheet layouts that the original
//! analysis hard-coded are explicit, validated parameters here. Use
//! [`PrepConfig::builder()`] to override individual fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::calendar::QuarterWindow;

/// How a sheet is laid out in the input workbook: its name, the count of
/// non-data metadata rows above the header, and the number of stacked
/// header rows (1 or 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetLayout {
    pub name: String,
    pub skip_rows: usize,
    pub header_rows: usize,
}

impl SheetLayout {
    pub fn new(name: impl Into<String>, skip_rows: usize, header_rows: usize) -> Self {
        Self {
            name: name.into(),
            skip_rows,
            header_rows,
        }
    }
}

fn default_range_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 3, 1).expect("valid default start date")
}

fn default_range_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 1).expect("valid default end date")
}

/// Configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Source workbook location.
    pub input_path: PathBuf,

    /// Destination workbook location.
    pub output_path: PathBuf,

    /// Layout of the monthly housing sheet.
    /// Default: sheet "housing", 6 metadata rows, 2 stacked header rows.
    pub housing_sheet: SheetLayout,

    /// Layout of the quarterly unemployment sheet.
    /// Default: sheet "unemployment", 6 metadata rows, flat header.
    pub unemployment_sheet: SheetLayout,

    /// Name of the unemployment rate column to analyse and chart.
    /// Default: "London"
    pub region: String,

    /// Start of the shared date range (inclusive, compared by quarter).
    /// Default: 1995-03-01
    pub range_start: NaiveDate,

    /// End of the shared date range (inclusive, compared by quarter).
    /// Default: 2023-06-01
    pub range_end: NaiveDate,

    /// Sheet name for the cleaned housing table in the output workbook.
    pub housing_output_sheet: String,

    /// Sheet name for the cleaned unemployment table in the output workbook.
    pub unemployment_output_sheet: String,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("dataset.xlsx"),
            output_path: PathBuf::from("dataset_prepared.xlsx"),
            housing_sheet: SheetLayout::new("housing", 6, 2),
            unemployment_sheet: SheetLayout::new("unemployment", 6, 1),
            region: "London".to_string(),
            range_start: default_range_start(),
            range_end: default_range_end(),
            housing_output_sheet: "Housing".to_string(),
            unemployment_output_sheet: "Unemployment".to_string(),
        }
    }
}

impl PrepConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PrepConfigBuilder {
        PrepConfigBuilder::default()
    }

    /// The inclusive quarter window derived from the configured bounds.
    pub fn window(&self) -> QuarterWindow {
        QuarterWindow::from_dates(self.range_start, self.range_end)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.range_start > self.range_end {
            return Err(ConfigValidationError::InvalidDateWindow {
                start: self.range_start,
                end: self.range_end,
            });
        }

        if self.region.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("region"));
        }

        for layout in [&self.housing_sheet, &self.unemployment_sheet] {
            if layout.name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyField("sheet name"));
            }
            if !(1..=2).contains(&layout.header_rows) {
                return Err(ConfigValidationError::InvalidHeaderRows(layout.header_rows));
            }
        }

        if self.input_path == self.output_path {
            return Err(ConfigValidationError::OutputOverwritesInput(
                self.output_path.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid date window: start {start} is after end {end}")]
    InvalidDateWindow { start: NaiveDate, end: NaiveDate },

    #[error("Configuration field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid header row count: {0} (must be 1 or 2)")]
    InvalidHeaderRows(usize),

    #[error("Output path '{0}' would overwrite the input workbook")]
    OutputOverwritesInput(PathBuf),
}

/// Builder for [`PrepConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PrepConfigBuilder {
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    housing_sheet: Option<SheetLayout>,
    unemployment_sheet: Option<SheetLayout>,
    region: Option<String>,
    range_start: Option<NaiveDate>,
    range_end: Option<NaiveDate>,
}

impl PrepConfigBuilder {
    /// Set the source workbook location.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the destination workbook location.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the housing sheet layout.
    pub fn housing_sheet(mut self, layout: SheetLayout) -> Self {
        self.housing_sheet = Some(layout);
        self
    }

    /// Set the unemployment sheet layout.
    pub fn unemployment_sheet(mut self, layout: SheetLayout) -> Self {
        self.unemployment_sheet = Some(layout);
        self
    }

    /// Set the region column to analyse.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the inclusive start of the shared date range.
    pub fn range_start(mut self, date: NaiveDate) -> Self {
        self.range_start = Some(date);
        self
    }

    /// Set the inclusive end of the shared date range.
    pub fn range_end(mut self, date: NaiveDate) -> Self {
        self.range_end = Some(date);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PrepConfig` or an error if validation fails.
    pub fn build(self) -> Result<PrepConfig, ConfigValidationError> {
        let defaults = PrepConfig::default();
        let config = PrepConfig {
            input_path: self.input_path.unwrap_or(defaults.input_path),
            output_path: self.output_path.unwrap_or(defaults.output_path),
            housing_sheet: self.housing_sheet.unwrap_or(defaults.housing_sheet),
            unemployment_sheet: self
                .unemployment_sheet
                .unwrap_or(defaults.unemployment_sheet),
            region: self.region.unwrap_or(defaults.region),
            range_start: self.range_start.unwrap_or(defaults.range_start),
            range_end: self.range_end.unwrap_or(defaults.range_end),
            housing_output_sheet: defaults.housing_output_sheet,
            unemployment_output_sheet: defaults.unemployment_output_sheet,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PrepConfig::default();
        assert_eq!(config.region, "London");
        assert_eq!(config.housing_sheet.skip_rows, 6);
        assert_eq!(config.housing_sheet.header_rows, 2);
        assert_eq!(config.unemployment_sheet.header_rows, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_window() {
        let window = PrepConfig::default().window();
        assert_eq!(window.start.label(), "1995 Q1");
        assert_eq!(window.end.label(), "2023 Q2");
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PrepConfig::builder()
            .input_path("data/source.xlsx")
            .output_path("data/prepared.xlsx")
            .region("North East")
            .build()
            .unwrap();

        assert_eq!(config.input_path, PathBuf::from("data/source.xlsx"));
        assert_eq!(config.region, "North East");
    }

    #[test]
    fn test_validation_inverted_window() {
        let result = PrepConfig::builder()
            .range_start(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap())
            .range_end(NaiveDate::from_ymd_opt(1995, 3, 1).unwrap())
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidDateWindow { .. }
        ));
    }

    #[test]
    fn test_validation_empty_region() {
        let result = PrepConfig::builder().region("   ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyField("region")
        ));
    }

    #[test]
    fn test_validation_header_rows() {
        let result = PrepConfig::builder()
            .housing_sheet(SheetLayout::new("housing", 6, 3))
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidHeaderRows(3)
        ));
    }

    #[test]
    fn test_validation_output_overwrites_input() {
        let result = PrepConfig::builder()
            .input_path("same.xlsx")
            .output_path("same.xlsx")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::OutputOverwritesInput(_)
        ));
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = PrepConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PrepConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.region, deserialized.region);
        assert_eq!(config.range_start, deserialized.range_start);
    }
}
