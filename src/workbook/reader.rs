//! Workbook loading.
//!
//! A sheet is read by skipping a configured count of metadata rows,
//! consuming one or two header rows, and collecting the remaining rows
//! into a `DataFrame`. The first column is kept as text (the period
//! column, parsed later by the cleaner); every other column is read as a
//! nullable float.

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use polars::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::SheetLayout;
use crate::error::{PrepError, Result};
use crate::utils::{flatten_labels, parse_numeric_string};

/// Reader over one input workbook.
pub struct WorkbookReader {
    workbook: Sheets<BufReader<File>>,
    path: PathBuf,
}

impl WorkbookReader {
    /// Open a workbook, auto-detecting its format from the extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let workbook = open_workbook_auto(&path)?;
        Ok(Self { workbook, path })
    }

    /// Read one sheet into a `DataFrame`.
    ///
    /// When `rename` is given, the flattened header labels are replaced
    /// positionally; a width mismatch is a load error. Fully empty rows
    /// are skipped.
    pub fn read_sheet(
        &mut self,
        layout: &SheetLayout,
        rename: Option<&[&str]>,
    ) -> Result<DataFrame> {
        if !self
            .workbook
            .sheet_names()
            .iter()
            .any(|name| name == &layout.name)
        {
            return Err(PrepError::SheetNotFound {
                sheet: layout.name.clone(),
                path: self.path.display().to_string(),
            });
        }

        let range = self.workbook.worksheet_range(&layout.name)?;

        // skip_rows counts from the top of the sheet, but the range only
        // covers the used area; discount any leading blank rows
        let start_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
        let skip = layout.skip_rows.saturating_sub(start_row);
        let rows: Vec<&[Data]> = range.rows().skip(skip).collect();

        if rows.len() <= layout.header_rows {
            return Err(PrepError::EmptySheet(layout.name.clone()));
        }

        let (header_rows, data_rows) = rows.split_at(layout.header_rows);
        let width = header_rows
            .iter()
            .chain(data_rows.iter())
            .map(|row| row.len())
            .max()
            .unwrap_or(0);

        let mut names = flatten_header(header_rows, width);
        if let Some(rename) = rename {
            if rename.len() != width {
                return Err(PrepError::ColumnCountMismatch {
                    sheet: layout.name.clone(),
                    expected: rename.len(),
                    found: width,
                });
            }
            names = rename.iter().map(|name| name.to_string()).collect();
        }

        let data_rows: Vec<&&[Data]> = data_rows
            .iter()
            .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
            .collect();

        if data_rows.is_empty() {
            return Err(PrepError::EmptySheet(layout.name.clone()));
        }

        let mut columns: Vec<Column> = Vec::with_capacity(width);
        for (idx, name) in names.iter().enumerate() {
            let column = if idx == 0 {
                let values: Vec<Option<String>> = data_rows
                    .iter()
                    .map(|row| row.get(idx).and_then(cell_to_period_string))
                    .collect();
                Series::new(name.as_str().into(), values).into_column()
            } else {
                let values: Vec<Option<f64>> = data_rows
                    .iter()
                    .map(|row| row.get(idx).and_then(cell_to_number))
                    .collect();
                Series::new(name.as_str().into(), values).into_column()
            };
            columns.push(column);
        }

        let df = DataFrame::new(columns)?;
        debug!(
            "Loaded sheet '{}': {} rows x {} columns",
            layout.name,
            df.height(),
            df.width()
        );
        Ok(df)
    }
}

/// Flatten one or two header rows into per-column labels.
///
/// The top header row is forward-filled first, so a label that spans
/// merged cells (region name over "Value" / "Annual growth") applies to
/// every column underneath it.
fn flatten_header(header_rows: &[&[Data]], width: usize) -> Vec<String> {
    let mut levels: Vec<Vec<String>> = header_rows
        .iter()
        .map(|row| {
            (0..width)
                .map(|idx| row.get(idx).map(cell_display).unwrap_or_default())
                .collect()
        })
        .collect();

    if levels.len() > 1 {
        let mut carried = String::new();
        for label in levels[0].iter_mut() {
            if label.is_empty() {
                *label = carried.clone();
            } else {
                carried = label.clone();
            }
        }
    }

    (0..width)
        .map(|idx| {
            let parts: Vec<&str> = levels.iter().map(|row| row[idx].as_str()).collect();
            flatten_labels(&parts)
        })
        .collect()
}

/// Render a header cell as a trimmed label.
fn cell_display(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Render a period cell as text for the cleaner's date parser.
///
/// Date cells become ISO `%Y-%m-%d` strings; anything unrenderable
/// becomes `None` and prunes out later as an unparseable period.
fn cell_to_period_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|ndt| ndt.date().format("%Y-%m-%d").to_string()),
        Data::DateTimeIso(s) => Some(s.chars().take(10).collect()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(_) | Data::DurationIso(_) | Data::Error(_) | Data::Empty => None,
    }
}

/// Extract a numeric cell as `f64`, tolerating formatted strings.
fn cell_to_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::String(s) => parse_numeric_string(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_header_forward_fills_top_row() {
        let top = vec![
            Data::String("Month".to_string()),
            Data::String("London".to_string()),
            Data::Empty,
            Data::String("England".to_string()),
            Data::Empty,
        ];
        let bottom = vec![
            Data::Empty,
            Data::String("Value".to_string()),
            Data::String("Annual growth".to_string()),
            Data::String("Value".to_string()),
            Data::String("Annual growth".to_string()),
        ];
        let rows: Vec<&[Data]> = vec![&top, &bottom];

        let names = flatten_header(&rows, 5);
        assert_eq!(
            names,
            vec![
                "Month",
                "London_Value",
                "London_Annual growth",
                "England_Value",
                "England_Annual growth",
            ]
        );
    }

    #[test]
    fn test_flatten_header_single_row() {
        let row = vec![
            Data::String("Quarter".to_string()),
            Data::String(" London ".to_string()),
        ];
        let rows: Vec<&[Data]> = vec![&row];

        let names = flatten_header(&rows, 2);
        assert_eq!(names, vec!["Quarter", "London"]);
    }

    #[test]
    fn test_cell_to_number() {
        assert_eq!(cell_to_number(&Data::Float(4.5)), Some(4.5));
        assert_eq!(cell_to_number(&Data::Int(7)), Some(7.0));
        assert_eq!(
            cell_to_number(&Data::String("1,234.5".to_string())),
            Some(1234.5)
        );
        assert_eq!(cell_to_number(&Data::Empty), None);
        assert_eq!(cell_to_number(&Data::String("n/a".to_string())), None);
    }

    #[test]
    fn test_cell_to_period_string() {
        assert_eq!(
            cell_to_period_string(&Data::String(" Jan-Mar 1995 ".to_string())),
            Some("Jan-Mar 1995".to_string())
        );
        assert_eq!(
            cell_to_period_string(&Data::DateTimeIso("1995-01-01T00:00:00".to_string())),
            Some("1995-01-01".to_string())
        );
        assert_eq!(cell_to_period_string(&Data::Empty), None);
    }

    #[test]
    fn test_open_missing_workbook_fails() {
        assert!(WorkbookReader::open("does-not-exist.xlsx").is_err());
    }
}
