//! Output workbook export.
//!
//! Each cleaned table becomes one sheet: a single header row of trimmed
//! column names, then the data rows with no index column. Date columns are
//! written as real date cells with a `yyyy-mm-dd` format; nulls are left
//! as blank cells.

use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

use crate::calendar::from_epoch_days;
use crate::error::Result;

/// Write the given tables to a new workbook, one sheet per table.
///
/// Any I/O failure aborts the run and surfaces as an export error; the
/// workbook handle is dropped either way.
pub fn write_workbook(path: &Path, sheets: &[(&str, &DataFrame)]) -> Result<()> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    for (sheet_name, df) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*sheet_name)?;

        for (col_idx, name) in df.get_column_names().iter().enumerate() {
            worksheet.write_string(0, col_idx as u16, name.trim())?;
        }

        for (col_idx, column) in df.get_columns().iter().enumerate() {
            let series = column.as_materialized_series();
            let col = col_idx as u16;

            match series.dtype() {
                DataType::String => {
                    let values = series.str()?;
                    for (row_idx, value) in values.into_iter().enumerate() {
                        if let Some(text) = value {
                            worksheet.write_string(row_idx as u32 + 1, col, text)?;
                        }
                    }
                }
                DataType::Date => {
                    let physical = series.to_physical_repr();
                    let days = physical.i32()?;
                    for (row_idx, value) in days.into_iter().enumerate() {
                        if let Some(date) = value.and_then(from_epoch_days) {
                            worksheet.write_with_format(
                                row_idx as u32 + 1,
                                col,
                                &date,
                                &date_format,
                            )?;
                        }
                    }
                }
                _ => {
                    let floats = series.cast(&DataType::Float64)?;
                    let values = floats.f64()?;
                    for (row_idx, value) in values.into_iter().enumerate() {
                        if let Some(number) = value {
                            worksheet.write_number(row_idx as u32 + 1, col, number)?;
                        }
                    }
                }
            }
        }
    }

    workbook.save(path)?;
    info!("Wrote {} sheets to {}", sheets.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_workbook_creates_file() {
        let df = df![
            "Quarter" => ["1995 Q1", "1995 Q2"],
            "region_value" => [100.0, 110.0],
        ]
        .unwrap();

        let path = std::env::temp_dir().join("quarterline_writer_basic.xlsx");
        write_workbook(&path, &[("Housing", &df)]).unwrap();

        assert!(path.exists());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_workbook_unwritable_path_fails() {
        let df = df!["Quarter" => ["1995 Q1"]].unwrap();
        let path = Path::new("no-such-directory/out.xlsx");
        assert!(write_workbook(path, &[("Housing", &df)]).is_err());
    }
}
