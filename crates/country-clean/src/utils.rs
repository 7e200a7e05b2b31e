//! Shared helpers used across the cleaning stages.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

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

/// Owned column names, in table order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Total number of missing cells in the table.
pub fn total_missing(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|col| col.null_count()).sum()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Decoration characters removed from text cells before numeric parsing.
pub const DECORATION_CHARS: [char; 3] = ['$', '%', ','];

/// Remove currency, percent and thousands-separator characters.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(strip_decorations("$1,234.5%"), "1234.5");
/// ```
pub fn strip_decorations(s: &str) -> String {
    s.chars().filter(|c| !DECORATION_CHARS.contains(c)).collect()
}

/// Parse a cell as a number. Surrounding whitespace is ignored; NaN counts as
/// unparseable so it ends up missing rather than as a number.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

// =============================================================================
// Series Utilities
// =============================================================================

/// Read any column as `Vec<Option<f64>>`.
///
/// Text cells are parsed with [`parse_number`]; numeric cells are cast. NaN
/// becomes None in both cases.
pub fn series_to_f64(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    if series.dtype() == &DataType::String {
        Ok(series
            .str()?
            .into_iter()
            .map(|opt| opt.and_then(parse_number))
            .collect())
    } else {
        let cast = series.cast(&DataType::Float64)?;
        Ok(cast
            .f64()?
            .into_iter()
            .map(|opt| opt.filter(|v| !v.is_nan()))
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
