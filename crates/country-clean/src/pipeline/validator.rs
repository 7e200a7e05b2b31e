//! Key-column validation.

use crate::error::Result;
use crate::utils::series_to_f64;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Re-parses each key column as numeric and clears negative values.
///
/// Cells that do not parse become missing, as do values below zero. Zero is
/// valid. Validated columns are written back as `Float64`; absent key columns
/// are skipped.
pub struct KeyColumnValidator;

impl KeyColumnValidator {
    /// Returns the number of present cells that became missing, per column.
    pub fn validate(df: &mut DataFrame, key_columns: &[String]) -> Result<BTreeMap<String, usize>> {
        let mut invalid_by_column = BTreeMap::new();

        for key in key_columns {
            let Ok(column) = df.column(key) else {
                continue;
            };
            let series = column.as_materialized_series();
            let present_before = series.len() - series.null_count();

            let validated: Vec<Option<f64>> = series_to_f64(series)?
                .into_iter()
                .map(|opt| opt.filter(|v| *v >= 0.0))
                .collect();
            let present_after = validated.iter().filter(|v| v.is_some()).count();
            let invalid = present_before.saturating_sub(present_after);

            if invalid > 0 {
                debug!("Cleared {} invalid values in '{}'", invalid, key);
            }
            df.replace(key, Series::new(key.as_str().into(), validated))?;
            invalid_by_column.insert(key.clone(), invalid);
        }

        Ok(invalid_by_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_negatives_become_missing() {
        let mut df = df!["population" => [Some(10.0), Some(-5.0), Some(0.0), None]].unwrap();
        let keys = vec!["population".to_string()];

        let invalid = KeyColumnValidator::validate(&mut df, &keys).unwrap();
        assert_eq!(invalid.get("population"), Some(&1));

        let values: Vec<Option<f64>> = df
            .column("population")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(10.0), None, Some(0.0), None]);
    }

    #[test]
    fn test_unparseable_text_becomes_missing() {
        let mut df = df!["gdp" => [Some("12.5"), Some("n/a"), None]].unwrap();
        let keys = vec!["gdp".to_string()];

        let invalid = KeyColumnValidator::validate(&mut df, &keys).unwrap();
        assert_eq!(invalid.get("gdp"), Some(&1));
        assert_eq!(df.column("gdp").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("gdp").unwrap().null_count(), 2);
    }

    #[test]
    fn test_absent_column_skipped() {
        let mut df = df!["gdp" => [1.0]].unwrap();
        let keys = vec!["urban_population".to_string()];
        let invalid = KeyColumnValidator::validate(&mut df, &keys).unwrap();
        assert!(invalid.is_empty());
        assert_eq!(df.shape(), (1, 1));
    }
}
