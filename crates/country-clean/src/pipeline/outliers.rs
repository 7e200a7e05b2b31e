//! Outlier handling module.
//!
//! Values of a key column outside its quantile bounds are turned missing. The
//! row stays; only the cell is cleared.

use crate::error::{PipelineError, Result};
use crate::types::ColumnKind;
use crate::utils::series_to_f64;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Quantile of sorted values with linear interpolation between the two
/// nearest ranks. Returns None for an empty slice.
///
/// ```rust,ignore
/// assert_eq!(linear_quantile(&[1.0, 2.0, 3.0, 4.0], 0.5), Some(2.5));
/// ```
pub fn linear_quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Clears key-column values outside `[q_low, q_high]` quantile bounds.
pub struct OutlierHandler {
    quantile_low: f64,
    quantile_high: f64,
}

impl OutlierHandler {
    pub fn new(quantile_low: f64, quantile_high: f64) -> Self {
        Self {
            quantile_low,
            quantile_high,
        }
    }

    /// Filter every key column present in the table.
    ///
    /// Bounds come from the column's present values. A value strictly above
    /// the upper bound or strictly below the lower bound becomes missing;
    /// values equal to a bound are kept. Filtered columns are written back as
    /// `Float64`.
    ///
    /// Absent key columns and text columns with no present values are
    /// skipped. A text column that still holds values is an error.
    ///
    /// Returns the number of cells cleared per filtered column.
    pub fn filter(
        &self,
        df: &mut DataFrame,
        key_columns: &[String],
    ) -> Result<BTreeMap<String, usize>> {
        let mut removed_by_column = BTreeMap::new();

        for key in key_columns {
            let Ok(column) = df.column(key) else {
                debug!("Key column '{}' not in table, skipping outlier filter", key);
                continue;
            };
            let series = column.as_materialized_series();

            if ColumnKind::from_dtype(series.dtype()) == ColumnKind::Text {
                if series.null_count() == series.len() {
                    debug!("Key column '{}' has no values, skipping outlier filter", key);
                    continue;
                }
                return Err(PipelineError::NonNumericKeyColumn {
                    column: key.clone(),
                });
            }

            let values = series_to_f64(series)?;
            let mut present: Vec<f64> = values.iter().flatten().copied().collect();
            if present.is_empty() {
                continue;
            }
            present.sort_by(f64::total_cmp);

            let (Some(lower), Some(upper)) = (
                linear_quantile(&present, self.quantile_low),
                linear_quantile(&present, self.quantile_high),
            ) else {
                continue;
            };

            let mut removed = 0;
            let filtered: Vec<Option<f64>> = values
                .into_iter()
                .map(|opt| match opt {
                    Some(v) if v > upper || v < lower => {
                        removed += 1;
                        None
                    }
                    other => other,
                })
                .collect();

            debug!(
                "Outlier bounds for '{}': [{}, {}], cleared {} values",
                key, lower, upper, removed
            );
            df.replace(key, Series::new(key.as_str().into(), filtered))?;
            removed_by_column.insert(key.clone(), removed);
        }

        Ok(removed_by_column)
    }
}
