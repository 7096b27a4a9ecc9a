//! Quarterly cleaning and alignment pipeline for housing and
//! labour-market series.
//!
//! # Overview
//!
//! One run ingests two sheets of a workbook (a monthly housing-price
//! series and a quarterly unemployment-rate series) and:
//!
//! - **Loads** both tables, skipping metadata rows and flattening stacked
//!   headers
//! - **Profiles** the raw tables (shape, nulls, descriptive statistics)
//! - **Cleans and aligns** them to a shared quarterly timeline: housing is
//!   resampled to quarterly means, free-text quarter labels are parsed to
//!   dates, and both series are restricted to one inclusive quarter window
//! - **Flags outliers** per series with IQR fences (diagnostic only)
//! - **Exports** the cleaned tables to a new workbook
//! - **Charts** the aligned series in an interactive window
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quarterline::{Pipeline, PrepConfig};
//!
//! let config = PrepConfig::builder()
//!     .input_path("dataset.xlsx")
//!     .output_path("dataset_prepared.xlsx")
//!     .region("London")
//!     .build()?;
//!
//! let result = Pipeline::new(config)?.run()?;
//! for report in &result.outliers {
//!     print!("{report}");
//! }
//! quarterline::chart::show(&result.dataset, "London")?;
//! ```

pub mod calendar;
pub mod chart;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod profiler;
pub mod types;
pub mod utils;
pub mod workbook;

// Re-exports for convenient access
pub use calendar::{Quarter, QuarterWindow};
pub use config::{ConfigValidationError, PrepConfig, PrepConfigBuilder, SheetLayout};
pub use error::{PrepError, Result as PrepResult, ResultExt};
pub use pipeline::{FlaggedRow, OutlierReport, Pipeline, detect_outliers};
pub use profiler::{ColumnSummary, TableProfile, profile_table};
pub use types::{AlignedDataset, RunResult, RunSummary};
pub use workbook::{WorkbookReader, write_workbook};
