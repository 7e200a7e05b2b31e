//! Missingness export.
//!
//! The pipeline hands a [`MissingnessMatrix`] of the raw table to an optional
//! [`MissingnessSink`]. The bundled [`CsvMissingnessSink`] writes the data a
//! bar chart and a heatmap would be drawn from.

use super::generator::save_csv;
use crate::utils::column_names;
use anyhow::Result;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::info;

/// File name of the per-column missing counts.
pub const MISSING_COUNTS_FILE: &str = "missing_values_by_column.csv";
/// File name of the cell-level missingness matrix.
pub const MISSINGNESS_MATRIX_FILE: &str = "missingness_matrix.csv";

/// Boolean missingness of every cell, stored column-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingnessMatrix {
    columns: Vec<String>,
    cells: Vec<Vec<bool>>,
    height: usize,
}

impl MissingnessMatrix {
    pub fn from_dataframe(df: &DataFrame) -> Self {
        let cells = df
            .get_columns()
            .iter()
            .map(|col| {
                col.as_materialized_series()
                    .is_null()
                    .into_iter()
                    .map(|v| v.unwrap_or(false))
                    .collect()
            })
            .collect();

        Self {
            columns: column_names(df),
            cells,
            height: df.height(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_missing(&self, row: usize, column: usize) -> bool {
        self.cells
            .get(column)
            .and_then(|c| c.get(row))
            .copied()
            .unwrap_or(false)
    }

    /// Missing cell count per column, in table order.
    pub fn missing_per_column(&self) -> Vec<(&str, usize)> {
        self.columns
            .iter()
            .zip(&self.cells)
            .map(|(name, cells)| (name.as_str(), cells.iter().filter(|m| **m).count()))
            .collect()
    }
}

/// Receives the missingness matrix of the raw table.
///
/// Failures are logged by the pipeline and never abort a run.
pub trait MissingnessSink: Send + Sync {
    /// Consume the matrix; returns the files written, if any.
    fn write(&self, matrix: &MissingnessMatrix) -> Result<Vec<PathBuf>>;
}

/// Writes missing counts and the 0/1 matrix as CSV files into a directory.
#[derive(Debug, Clone)]
pub struct CsvMissingnessSink {
    dir: PathBuf,
}

impl CsvMissingnessSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn counts_table(matrix: &MissingnessMatrix) -> PolarsResult<DataFrame> {
        let counts = matrix.missing_per_column();
        df![
            "column" => counts.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            "missing_count" => counts.iter().map(|(_, n)| *n as u64).collect::<Vec<_>>(),
        ]
    }

    fn matrix_table(matrix: &MissingnessMatrix) -> PolarsResult<DataFrame> {
        let columns = matrix
            .columns
            .iter()
            .zip(&matrix.cells)
            .map(|(name, cells)| {
                let flags: Vec<u8> = cells.iter().map(|m| u8::from(*m)).collect();
                Series::new(name.as_str().into(), flags).into_column()
            })
            .collect();
        DataFrame::new(columns)
    }
}

impl MissingnessSink for CsvMissingnessSink {
    fn write(&self, matrix: &MissingnessMatrix) -> Result<Vec<PathBuf>> {
        let counts_path = self.dir.join(MISSING_COUNTS_FILE);
        let matrix_path = self.dir.join(MISSINGNESS_MATRIX_FILE);

        save_csv(&mut Self::counts_table(matrix)?, &counts_path)?;
        save_csv(&mut Self::matrix_table(matrix)?, &matrix_path)?;

        info!("Missingness data saved to {}", self.dir.display());
        Ok(vec![counts_path, matrix_path])
    }
}
