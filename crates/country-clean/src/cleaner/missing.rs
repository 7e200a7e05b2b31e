//! Missing-value policy for text and numeric columns.

use crate::config::{MissingStrategy, MissingValuePolicy};
use crate::error::Result;
use crate::types::ColumnKind;
use crate::utils::{column_names, series_to_f64};
use polars::prelude::*;
use tracing::debug;

/// Cells filled by one pass of [`MissingValueHandler::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillCounts {
    pub text: usize,
    pub numeric: usize,
}

/// Applies a [`MissingValuePolicy`] to every column.
///
/// Text columns always have surrounding whitespace trimmed from their
/// present cells. Missing text cells get the text fill value when the policy
/// asks for one. Numeric columns are only touched when the numeric strategy
/// is `FillWith`, in which case the column becomes `Float64`.
pub struct MissingValueHandler<'a> {
    policy: &'a MissingValuePolicy,
}

impl<'a> MissingValueHandler<'a> {
    pub fn new(policy: &'a MissingValuePolicy) -> Self {
        Self { policy }
    }

    pub fn apply(&self, mut df: DataFrame) -> Result<(DataFrame, FillCounts)> {
        let mut counts = FillCounts::default();

        for name in column_names(&df) {
            let column = df.column(&name)?;
            let series = column.as_materialized_series();

            let replacement = match ColumnKind::from_dtype(column.dtype()) {
                ColumnKind::Text => {
                    let fill = self.policy.text.fill_value().map(|v| v.trim());
                    let text = series.cast(&DataType::String)?;
                    let values: Vec<Option<String>> = text
                        .str()?
                        .into_iter()
                        .map(|opt| match opt {
                            Some(v) => Some(v.trim().to_string()),
                            None => fill.map(|f| {
                                counts.text += 1;
                                f.to_string()
                            }),
                        })
                        .collect();
                    Series::new(name.as_str().into(), values)
                }
                ColumnKind::Numeric => {
                    let MissingStrategy::FillWith(fill) = self.policy.numeric else {
                        continue;
                    };
                    if series.null_count() == 0 && !series.dtype().is_float() {
                        continue;
                    }
                    let values: Vec<Option<f64>> = series_to_f64(series)?
                        .into_iter()
                        .map(|opt| {
                            opt.or_else(|| {
                                counts.numeric += 1;
                                Some(fill)
                            })
                        })
                        .collect();
                    Series::new(name.as_str().into(), values)
                }
            };

            df.replace(&name, replacement)?;
        }

        debug!(
            "Filled {} text and {} numeric cells",
            counts.text, counts.numeric
        );
        Ok((df, counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UNKNOWN_LABEL;
    use pretty_assertions::assert_eq;

    fn text_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_default_policy_fills_text_and_trims() {
        let df = df![
            "capital" => [Some("  Kabul "), None, Some("Tirana")],
            "gdp" => [Some(1.0), None, Some(3.0)],
        ]
        .unwrap();

        let policy = MissingValuePolicy::default();
        let (df, counts) = MissingValueHandler::new(&policy).apply(df).unwrap();

        assert_eq!(counts, FillCounts { text: 1, numeric: 0 });
        assert_eq!(
            text_values(&df, "capital"),
            vec![
                Some("Kabul".to_string()),
                Some(UNKNOWN_LABEL.to_string()),
                Some("Tirana".to_string()),
            ]
        );
        // numeric cells stay missing
        assert_eq!(df.column("gdp").unwrap().null_count(), 1);
    }

    #[test]
    fn test_leave_missing_text() {
        let df = df!["capital" => [Some(" a "), None]].unwrap();
        let policy = MissingValuePolicy {
            text: MissingStrategy::LeaveMissing,
            numeric: MissingStrategy::LeaveMissing,
        };
        let (df, counts) = MissingValueHandler::new(&policy).apply(df).unwrap();

        assert_eq!(counts, FillCounts::default());
        assert_eq!(
            text_values(&df, "capital"),
            vec![Some("a".to_string()), None]
        );
    }

    #[test]
    fn test_numeric_fill() {
        let df = df!["gdp" => [Some(1i64), None, Some(3)]].unwrap();
        let policy = MissingValuePolicy {
            text: MissingStrategy::LeaveMissing,
            numeric: MissingStrategy::FillWith(-1.0),
        };
        let (df, counts) = MissingValueHandler::new(&policy).apply(df).unwrap();

        assert_eq!(counts.numeric, 1);
        let values: Vec<Option<f64>> = df
            .column("gdp")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(1.0), Some(-1.0), Some(3.0)]);
    }

    #[test]
    fn test_complete_integer_column_keeps_dtype() {
        let df = df!["n" => [1i64, 2]].unwrap();
        let policy = MissingValuePolicy {
            text: MissingStrategy::LeaveMissing,
            numeric: MissingStrategy::FillWith(0.0),
        };
        let (df, _) = MissingValueHandler::new(&policy).apply(df).unwrap();
        assert_eq!(df.column("n").unwrap().dtype(), &DataType::Int64);
    }
}
