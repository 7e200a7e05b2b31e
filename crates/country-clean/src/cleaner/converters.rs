//! Text-to-numeric coercion.

use crate::error::Result;
use crate::types::ColumnKind;
use crate::utils::{column_names, parse_number, strip_decorations};
use polars::prelude::*;
use tracing::debug;

/// Turns decorated text columns (`"$1,000"`, `"12%"`) into numeric ones.
///
/// Every text column has `$`, `%` and `,` stripped from its cells. The
/// column is then committed as `Float64` if at least `threshold * rows` of
/// its cells parse as numbers; cells that do not parse become missing.
/// Otherwise the column stays text, keeping the stripped values. A text
/// column with no present cells is committed as an all-missing `Float64`.
#[derive(Debug, Clone, Copy)]
pub struct ValueCoercer {
    threshold: f64,
}

impl ValueCoercer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Coerce every text column. Returns the table and the names of the
    /// columns committed as numeric, in table order.
    pub fn coerce(&self, mut df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        let height = df.height();
        let min_parsed = self.threshold * height as f64;
        let mut coerced = Vec::new();

        for name in column_names(&df) {
            let column = df.column(&name)?;
            if ColumnKind::from_dtype(column.dtype()) != ColumnKind::Text {
                continue;
            }

            let text = column.as_materialized_series().cast(&DataType::String)?;
            let stripped: Vec<Option<String>> = text
                .str()?
                .into_iter()
                .map(|opt| opt.map(strip_decorations))
                .collect();
            let parsed: Vec<Option<f64>> = stripped
                .iter()
                .map(|opt| opt.as_deref().and_then(parse_number))
                .collect();
            let parsed_count = parsed.iter().filter(|v| v.is_some()).count();
            let is_empty = text.null_count() == height;

            if is_empty || parsed_count as f64 >= min_parsed {
                debug!(
                    "Coercing '{}' to numeric ({}/{} cells parsed)",
                    name, parsed_count, height
                );
                df.replace(&name, Series::new(name.as_str().into(), parsed))?;
                coerced.push(name);
            } else {
                df.replace(&name, Series::new(name.as_str().into(), stripped))?;
            }
        }

        Ok((df, coerced))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_currency_column_is_coerced() {
        let df = df![
            "gdp" => ["$1,000", "$2,500", "N/A", "$300", "$4"],
        ]
        .unwrap();

        let (df, coerced) = ValueCoercer::new(0.8).coerce(df).unwrap();
        assert_eq!(coerced, vec!["gdp"]);
        assert_eq!(df.column("gdp").unwrap().dtype(), &DataType::Float64);
        assert_eq!(
            f64_values(&df, "gdp"),
            vec![Some(1000.0), Some(2500.0), None, Some(300.0), Some(4.0)]
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // 4 of 5 parse: exactly 80%
        let df = df!["v" => ["1", "2", "3", "4", "x"]].unwrap();
        let (_, coerced) = ValueCoercer::new(0.8).coerce(df).unwrap();
        assert_eq!(coerced, vec!["v"]);

        // 3 of 5 parse: below
        let df = df!["v" => ["1", "2", "3", "y", "x"]].unwrap();
        let (df, coerced) = ValueCoercer::new(0.8).coerce(df).unwrap();
        assert!(coerced.is_empty());
        assert_eq!(df.column("v").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_four_of_six_stays_text() {
        let df = df!["v" => ["1", "2", "3", "4", "x", "y"]].unwrap();
        let (df, coerced) = ValueCoercer::new(0.8).coerce(df).unwrap();
        assert!(coerced.is_empty());
        assert_eq!(df.column("v").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_empty_text_column_becomes_numeric() {
        let df = df![
            "armed_forces_size" => [None::<&str>, None, None],
            "country" => ["A", "B", "C"],
        ]
        .unwrap();
        let (df, coerced) = ValueCoercer::new(0.8).coerce(df).unwrap();

        assert_eq!(coerced, vec!["armed_forces_size"]);
        assert_eq!(
            df.column("armed_forces_size").unwrap().dtype(),
            &DataType::Float64
        );
        assert_eq!(f64_values(&df, "armed_forces_size"), vec![None, None, None]);
    }

    #[test]
    fn test_missing_cells_count_against_threshold() {
        let df = df!["v" => [Some("1"), Some("2"), None, None, Some("5")]].unwrap();
        let (df, coerced) = ValueCoercer::new(0.8).coerce(df).unwrap();
        assert!(coerced.is_empty());
        assert_eq!(df.column("v").unwrap().null_count(), 2);
    }

    #[test]
    fn test_text_column_keeps_stripped_values() {
        let df = df!["country" => ["Afghanistan", "Côte d'Ivoire, Rep.", "100%"]].unwrap();
        let (df, coerced) = ValueCoercer::new(0.8).coerce(df).unwrap();
        assert!(coerced.is_empty());

        let values: Vec<Option<&str>> = df
            .column("country")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            values,
            vec![Some("Afghanistan"), Some("Côte d'Ivoire Rep."), Some("100")]
        );
    }

    #[test]
    fn test_numeric_columns_untouched() {
        let df = df!["n" => [1i64, 2, 3]].unwrap();
        let (df, coerced) = ValueCoercer::new(0.8).coerce(df).unwrap();
        assert!(coerced.is_empty());
        assert_eq!(df.column("n").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_shape_is_preserved() {
        let df = df![
            "a" => ["$1", "bad", "$3"],
            "b" => ["x", "y", "z"],
        ]
        .unwrap();
        let shape = df.shape();
        let (df, _) = ValueCoercer::new(0.5).coerce(df).unwrap();
        assert_eq!(df.shape(), shape);
    }
}
