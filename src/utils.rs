//! Shared helpers for cell parsing, column labels and dtype checks.

use polars::prelude::DataType;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Characters commonly used in numeric formatting that should be stripped
/// before parsing.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as an `f64`, tolerating currency symbols,
/// percent signs and thousands separators.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Flatten stacked header labels into a single column name.
///
/// Non-empty trimmed levels are joined with an underscore: the levels
/// `["London", "Annual growth"]` flatten to `"London_Annual growth"`,
/// while `["Month", ""]` flattens to `"Month"`.
pub fn flatten_labels(levels: &[&str]) -> String {
    levels
        .iter()
        .map(|level| level.trim())
        .filter(|level| !level.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
