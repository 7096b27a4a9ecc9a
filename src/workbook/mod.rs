//! Workbook I/O.
//!
//! Reading via `calamine`, writing via `rust_xlsxwriter`. Both sides share
//! one column-flattening rule: stacked header labels are joined with an
//! underscore and trimmed at load, so every table in the pipeline carries
//! flat single-string column names.

mod reader;
mod writer;

pub use reader::WorkbookReader;
pub use writer::write_workbook;
