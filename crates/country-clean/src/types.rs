use polars::prelude::{DataFrame, DataType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::utils::is_numeric_dtype;

/// Kind of a column as seen by the cleaning stages.
///
/// Decided from the column's dtype. The loader casts every other dtype to
/// `String`, so a loaded table only holds these two kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Numeric,
}

impl ColumnKind {
    pub fn from_dtype(dtype: &DataType) -> Self {
        if is_numeric_dtype(dtype) {
            Self::Numeric
        } else {
            Self::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Numeric => "numeric",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-column quality figures for the report and the summary CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnQuality {
    pub name: String,
    /// Polars dtype name, e.g. `str` or `f64`.
    pub dtype: String,
    pub kind: ColumnKind,
    pub missing_count: usize,
    pub missing_percentage: f64,
}

/// What the cleaning stages did to one table.
///
/// Maps are keyed by column name and ordered, so the summary serializes the
/// same way on every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows: usize,
    pub columns: usize,
    /// Raw name to canonical name, only for columns whose name changed.
    pub renamed_columns: BTreeMap<String, String>,
    /// Text columns committed as numeric.
    pub coerced_columns: Vec<String>,
    /// Text cells filled with the sentinel label.
    pub text_cells_filled: usize,
    /// Numeric cells filled with the configured value.
    pub numeric_cells_filled: usize,
    /// Cells turned missing by the outlier filter, per key column.
    pub outliers_removed: BTreeMap<String, usize>,
    /// Cells turned missing by validation, per key column.
    pub invalid_values_removed: BTreeMap<String, usize>,
    /// Configured key columns that were not in the table.
    pub skipped_key_columns: Vec<String>,
    pub missing_before: usize,
    pub missing_after: usize,
    pub duration_ms: u64,
}

impl CleaningSummary {
    pub fn total_outliers_removed(&self) -> usize {
        self.outliers_removed.values().sum()
    }

    pub fn total_invalid_values_removed(&self) -> usize {
        self.invalid_values_removed.values().sum()
    }
}

/// Output of [`Pipeline::clean`](crate::Pipeline::clean).
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub data: DataFrame,
    pub summary: CleaningSummary,
    pub processing_steps: Vec<String>,
}

/// Outcome of a full [`Pipeline::run`](crate::Pipeline::run).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub input_path: PathBuf,
    pub report_path: PathBuf,
    pub summary_path: PathBuf,
    /// Files written by the missingness sink, if one ran successfully.
    pub plot_files: Vec<PathBuf>,
    /// None in report-only mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned_path: Option<PathBuf>,
    /// None in report-only mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CleaningSummary>,
    pub processing_steps: Vec<String>,
}
