//! Column name normalization.

use crate::error::{PipelineError, Result};
use crate::utils::column_names;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

static SYMBOLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()\-/$]").expect("valid regex"));
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("valid regex"));

/// Rewrite a raw column label into its canonical form.
///
/// `"Col 1%"` becomes `"col_1pct"`, `"Density\n(P/Km2)"` becomes
/// `"density_p_km2"`. Canonical names are fixed points.
pub fn normalize_column_name(raw: &str) -> String {
    let name = raw.replace(['\n', '\r'], "");
    let name = SYMBOLS.replace_all(&name, "_");
    // after the symbol pass so a "$%" pair keeps its "pct"
    let name = name.replace('%', "pct");
    let name = name.replace(' ', "_");
    let name = UNDERSCORE_RUNS.replace_all(&name, "_");
    let name = name.trim_matches(|c: char| c == '_' || c.is_whitespace());
    name.to_lowercase().trim().to_string()
}

/// Renames every column of a table to its canonical name.
pub struct ColumnNameNormalizer;

impl ColumnNameNormalizer {
    /// Normalize all column names.
    ///
    /// Returns the renamed table and a map of raw to canonical names for the
    /// columns whose name changed. Fails with
    /// [`PipelineError::SchemaCollision`] when two raw names share a
    /// canonical name; columns are never merged.
    pub fn normalize(mut df: DataFrame) -> Result<(DataFrame, BTreeMap<String, String>)> {
        let raw_names = column_names(&df);
        let mut owners: HashMap<String, &str> = HashMap::with_capacity(raw_names.len());
        let mut canonical_names = Vec::with_capacity(raw_names.len());
        let mut renamed = BTreeMap::new();

        for raw in &raw_names {
            let canonical = normalize_column_name(raw);
            if let Some(first) = owners.get(&canonical) {
                return Err(PipelineError::SchemaCollision {
                    canonical,
                    first: first.to_string(),
                    second: raw.clone(),
                });
            }
            owners.insert(canonical.clone(), raw);

            if canonical != *raw {
                debug!("Renaming column {:?} -> '{}'", raw, canonical);
                renamed.insert(raw.clone(), canonical.clone());
            }
            canonical_names.push(canonical);
        }

        df.set_column_names(canonical_names)?;
        Ok((df, renamed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize_column_name("Col 1%"), "col_1pct");
        assert_eq!(normalize_column_name("$Col-2"), "col_2");
        assert_eq!(normalize_column_name("Density\n(P/Km2)"), "density_p_km2");
        assert_eq!(normalize_column_name("Land Area(Km2)"), "land_area_km2");
        assert_eq!(normalize_column_name("Tax revenue (%)"), "tax_revenue_pct");
        assert_eq!(normalize_column_name("Co2-Emissions"), "co2_emissions");
        assert_eq!(normalize_column_name("  Life expectancy "), "life_expectancy");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = [
            "Col 1%",
            "$Col-2",
            "Density\n(P/Km2)",
            "Gross primary education enrollment (%)",
            "Minimum wage",
            "\t_Odd / Name_ ",
            "already_canonical",
            "__x__",
        ];
        for name in raw {
            let once = normalize_column_name(name);
            let twice = normalize_column_name(&once);
            assert_eq!(once, twice, "normalizing {:?} twice changed it", name);
        }
    }

    #[test]
    fn test_normalize_table() {
        let df = df![
            "Col 1%" => [1],
            "$Col-2" => [2],
        ]
        .unwrap();

        let (df, renamed) = ColumnNameNormalizer::normalize(df).unwrap();
        assert_eq!(column_names(&df), vec!["col_1pct", "col_2"]);
        assert_eq!(renamed.len(), 2);
        assert_eq!(renamed.get("$Col-2").map(String::as_str), Some("col_2"));
    }

    #[test]
    fn test_canonical_names_not_reported_as_renamed() {
        let df = df!["gdp" => [1.0], "Population" => [2.0]].unwrap();
        let (_, renamed) = ColumnNameNormalizer::normalize(df).unwrap();
        assert_eq!(renamed.len(), 1);
        assert!(renamed.contains_key("Population"));
    }

    #[test]
    fn test_collision_is_an_error() {
        let df = df![
            "GDP" => [1.0],
            "gdp " => [2.0],
        ]
        .unwrap();

        match ColumnNameNormalizer::normalize(df) {
            Err(PipelineError::SchemaCollision {
                canonical,
                first,
                second,
            }) => {
                assert_eq!(canonical, "gdp");
                assert_eq!(first, "GDP");
                assert_eq!(second, "gdp ");
            }
            other => panic!("expected schema collision, got {:?}", other.map(|_| ())),
        }
    }
}
