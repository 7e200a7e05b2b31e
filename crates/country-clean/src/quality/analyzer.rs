use crate::cleaner::ColumnNameNormalizer;
use crate::types::{ColumnKind, ColumnQuality};
use crate::utils::{DECORATION_CHARS, column_names, total_missing};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rows shown in the report preview.
pub const PREVIEW_ROWS: usize = 5;

/// Quality figures for a raw table, before any cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub rows: usize,
    pub columns: usize,
    pub data_points: usize,
    pub missing_cells: usize,
    pub completeness_percentage: f64,
    /// One entry per column, in table order.
    pub column_quality: Vec<ColumnQuality>,
    pub text_columns: usize,
    pub numeric_columns: usize,
    /// Text columns with cells containing `$` or `%`.
    pub currency_columns: Vec<String>,
    pub percent_columns: Vec<String>,
    /// Rendered head of the preview columns, if the table has all of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl QualityAssessment {
    pub fn missing_percentage(&self) -> f64 {
        100.0 - self.completeness_percentage
    }

    /// Columns with at least one missing cell.
    pub fn columns_with_missing(&self) -> impl Iterator<Item = &ColumnQuality> {
        self.column_quality.iter().filter(|c| c.missing_count > 0)
    }
}

pub struct DataQualityAnalyzer;

impl DataQualityAnalyzer {
    /// Assess a raw table. `preview_columns` are canonical names.
    pub fn assess(df: &DataFrame, preview_columns: &[String]) -> PolarsResult<QualityAssessment> {
        let (rows, columns) = df.shape();
        let data_points = rows * columns;
        let missing_cells = total_missing(df);
        let completeness_percentage = if data_points == 0 {
            100.0
        } else {
            (data_points - missing_cells) as f64 / data_points as f64 * 100.0
        };

        let mut column_quality = Vec::with_capacity(columns);
        let mut currency_columns = Vec::new();
        let mut percent_columns = Vec::new();

        for col in df.get_columns() {
            let kind = ColumnKind::from_dtype(col.dtype());
            let missing_count = col.null_count();
            let missing_percentage = if rows == 0 {
                0.0
            } else {
                missing_count as f64 / rows as f64 * 100.0
            };

            if kind == ColumnKind::Text {
                let (has_currency, has_percent) = Self::scan_decorations(col)?;
                if has_currency {
                    currency_columns.push(col.name().to_string());
                }
                if has_percent {
                    percent_columns.push(col.name().to_string());
                }
            }

            column_quality.push(ColumnQuality {
                name: col.name().to_string(),
                dtype: col.dtype().to_string(),
                kind,
                missing_count,
                missing_percentage,
            });
        }

        let text_columns = column_quality
            .iter()
            .filter(|c| c.kind == ColumnKind::Text)
            .count();

        Ok(QualityAssessment {
            rows,
            columns,
            data_points,
            missing_cells,
            completeness_percentage,
            numeric_columns: columns - text_columns,
            text_columns,
            column_quality,
            currency_columns,
            percent_columns,
            preview: Self::preview(df, preview_columns),
        })
    }

    fn scan_decorations(col: &Column) -> PolarsResult<(bool, bool)> {
        let text = col.as_materialized_series().cast(&DataType::String)?;
        let mut has_currency = false;
        let mut has_percent = false;
        for value in text.str()?.into_iter().flatten() {
            has_currency |= value.contains(DECORATION_CHARS[0]);
            has_percent |= value.contains(DECORATION_CHARS[1]);
            if has_currency && has_percent {
                break;
            }
        }
        Ok((has_currency, has_percent))
    }

    /// Head of the preview columns, matched on canonical names. None when
    /// the names collide or a preview column is missing.
    fn preview(df: &DataFrame, preview_columns: &[String]) -> Option<String> {
        if preview_columns.is_empty() {
            return None;
        }
        let (renamed, _) = ColumnNameNormalizer::normalize(df.clone()).ok()?;
        let available = column_names(&renamed);
        if let Some(absent) = preview_columns.iter().find(|c| !available.contains(c)) {
            debug!("Skipping preview, column '{}' not in table", absent);
            return None;
        }
        let head = renamed.select(preview_columns.iter().map(String::as_str)).ok()?;
        Some(head.head(Some(PREVIEW_ROWS)).to_string())
    }
}
