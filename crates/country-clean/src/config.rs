//! Configuration types for the cleaning pipeline.
//!
//! Every threshold, path and column list lives in [`PipelineConfig`], which is
//! handed to the pipeline builder once. Use [`PipelineConfig::builder()`] for
//! programmatic setup or [`PipelineConfig::from_json_file`] to load a file.

use crate::cleaner::normalize_column_name;
use crate::error::{PipelineError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default upper quantile for outlier filtering.
pub const DEFAULT_QUANTILE_HIGH: f64 = 0.95;
/// Default lower quantile for outlier filtering.
pub const DEFAULT_QUANTILE_LOW: f64 = 0.05;
/// Share of parseable cells needed before a text column is committed as numeric.
pub const DEFAULT_NUMERIC_THRESHOLD: f64 = 0.8;
/// Sentinel label written into empty text cells by default.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Key columns of the world indicators dataset, in canonical form.
pub const DEFAULT_KEY_COLUMNS: [&str; 11] = [
    "population",
    "land_area_km2",
    "gdp",
    "life_expectancy",
    "density_p_km2",
    "birth_rate",
    "armed_forces_size",
    "infant_mortality",
    "maternal_mortality_ratio",
    "urban_population",
    "physicians_per_thousand",
];

/// Columns shown in the report's sample preview.
pub const DEFAULT_PREVIEW_COLUMNS: [&str; 4] =
    ["country", "abbreviation", "land_area_km2", "population"];

/// What to do with a missing cell of a given column kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MissingStrategy<T> {
    /// Keep the cell missing.
    LeaveMissing,
    /// Replace the cell with a fixed value.
    FillWith(T),
}

impl<T> MissingStrategy<T> {
    /// The fill value, if this strategy fills.
    pub fn fill_value(&self) -> Option<&T> {
        match self {
            Self::LeaveMissing => None,
            Self::FillWith(value) => Some(value),
        }
    }
}

/// Missing-value handling for text and numeric columns.
///
/// Numeric gaps are left missing by default: a numeric sentinel such as `-1`
/// would take part in the quantile and validity checks that follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValuePolicy {
    pub text: MissingStrategy<String>,
    pub numeric: MissingStrategy<f64>,
}

impl Default for MissingValuePolicy {
    fn default() -> Self {
        Self {
            text: MissingStrategy::FillWith(UNKNOWN_LABEL.to_string()),
            numeric: MissingStrategy::LeaveMissing,
        }
    }
}

/// Configuration for the cleaning pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper quantile (0.0 - 1.0); key-column values above it become missing.
    /// Default: 0.95
    pub quantile_high: f64,

    /// Lower quantile (0.0 - 1.0); key-column values below it become missing.
    /// Default: 0.05
    pub quantile_low: f64,

    /// Minimum share of parseable cells for a text column to become numeric.
    /// Default: 0.8
    pub numeric_threshold: f64,

    /// Canonical names of the columns subject to outlier filtering and validation.
    pub key_columns: Vec<String>,

    /// Missing-value handling.
    pub missing_values: MissingValuePolicy,

    /// Raw input CSV.
    pub input_path: PathBuf,

    /// Where the cleaned CSV is written.
    pub cleaned_path: PathBuf,

    /// Where the text quality report is written. The summary CSV sits next to it.
    pub report_path: PathBuf,

    /// Directory for missingness plot data. None disables the export.
    pub plot_dir: Option<PathBuf>,

    /// Append-only step log. None disables it.
    pub steps_log_path: Option<PathBuf>,

    /// Canonical names of the columns shown in the report preview.
    pub preview_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quantile_high: DEFAULT_QUANTILE_HIGH,
            quantile_low: DEFAULT_QUANTILE_LOW,
            numeric_threshold: DEFAULT_NUMERIC_THRESHOLD,
            key_columns: DEFAULT_KEY_COLUMNS.iter().map(|s| s.to_string()).collect(),
            missing_values: MissingValuePolicy::default(),
            input_path: PathBuf::from("data/raw/world-data-2023.csv"),
            cleaned_path: PathBuf::from("data/cleaned/world_data_2023_cleaned.csv"),
            report_path: PathBuf::from("results/task-a/reports/data_quality_report.txt"),
            plot_dir: None,
            steps_log_path: None,
            preview_columns: DEFAULT_PREVIEW_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = PipelineConfig::builder()
    ///     .quantile_high(0.99)
    ///     .key_columns(["gdp", "population"])
    ///     .build()?;
    /// ```
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .context(format!("Reading config file {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate().map_err(PipelineError::from)?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        for (field, value) in [
            ("quantile_high", self.quantile_high),
            ("quantile_low", self.quantile_low),
            ("numeric_threshold", self.numeric_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.quantile_low > self.quantile_high {
            return Err(ConfigValidationError::InvertedQuantiles {
                low: self.quantile_low,
                high: self.quantile_high,
            });
        }

        let mut seen = HashSet::new();
        for column in &self.key_columns {
            if column.is_empty() || normalize_column_name(column) != *column {
                return Err(ConfigValidationError::NonCanonicalKeyColumn(column.clone()));
            }
            if !seen.insert(column.as_str()) {
                return Err(ConfigValidationError::DuplicateKeyColumn(column.clone()));
            }
        }

        if let MissingStrategy::FillWith(value) = &self.missing_values.numeric
            && !value.is_finite()
        {
            return Err(ConfigValidationError::NonFiniteFill(*value));
        }

        Ok(())
    }

    /// Path of the per-column summary CSV that accompanies the text report.
    pub fn summary_path(&self) -> PathBuf {
        let report = self.report_path.to_string_lossy();
        match report.strip_suffix(".txt") {
            Some(stem) => PathBuf::from(format!("{stem}_summary.csv")),
            None => PathBuf::from(format!("{report}_summary.csv")),
        }
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Lower quantile {low} is above upper quantile {high}")]
    InvertedQuantiles { low: f64, high: f64 },

    #[error("Key column '{0}' is not a canonical column name")]
    NonCanonicalKeyColumn(String),

    #[error("Key column '{0}' is listed more than once")]
    DuplicateKeyColumn(String),

    #[error("Numeric fill value must be finite, got {0}")]
    NonFiniteFill(f64),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    base: Option<PipelineConfig>,
    quantile_high: Option<f64>,
    quantile_low: Option<f64>,
    numeric_threshold: Option<f64>,
    key_columns: Option<Vec<String>>,
    text_missing: Option<MissingStrategy<String>>,
    numeric_missing: Option<MissingStrategy<f64>>,
    input_path: Option<PathBuf>,
    cleaned_path: Option<PathBuf>,
    report_path: Option<PathBuf>,
    plot_dir: Option<PathBuf>,
    steps_log_path: Option<PathBuf>,
    preview_columns: Option<Vec<String>>,
}

impl PipelineConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    ///
    /// Used by the CLI to layer flags over a config file.
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            base: Some(config),
            ..Self::default()
        }
    }

    /// Set the upper outlier quantile.
    pub fn quantile_high(mut self, q: f64) -> Self {
        self.quantile_high = Some(q);
        self
    }

    /// Set the lower outlier quantile.
    pub fn quantile_low(mut self, q: f64) -> Self {
        self.quantile_low = Some(q);
        self
    }

    /// Set the share of parseable cells needed to coerce a text column.
    pub fn numeric_threshold(mut self, threshold: f64) -> Self {
        self.numeric_threshold = Some(threshold);
        self
    }

    /// Replace the key-column list.
    pub fn key_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the strategy for missing text cells.
    pub fn text_missing(mut self, strategy: MissingStrategy<String>) -> Self {
        self.text_missing = Some(strategy);
        self
    }

    /// Set the strategy for missing numeric cells.
    pub fn numeric_missing(mut self, strategy: MissingStrategy<f64>) -> Self {
        self.numeric_missing = Some(strategy);
        self
    }

    /// Set the input CSV path.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the cleaned CSV output path.
    pub fn cleaned_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cleaned_path = Some(path.into());
        self
    }

    /// Set the text report path.
    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Enable missingness plot data export into this directory.
    pub fn plot_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.plot_dir = Some(path.into());
        self
    }

    /// Enable the append-only step log.
    pub fn steps_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.steps_log_path = Some(path.into());
        self
    }

    /// Replace the report preview columns.
    pub fn preview_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preview_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let base = self.base.unwrap_or_default();
        let config = PipelineConfig {
            quantile_high: self.quantile_high.unwrap_or(base.quantile_high),
            quantile_low: self.quantile_low.unwrap_or(base.quantile_low),
            numeric_threshold: self.numeric_threshold.unwrap_or(base.numeric_threshold),
            key_columns: self.key_columns.unwrap_or(base.key_columns),
            missing_values: MissingValuePolicy {
                text: self.text_missing.unwrap_or(base.missing_values.text),
                numeric: self.numeric_missing.unwrap_or(base.missing_values.numeric),
            },
            input_path: self.input_path.unwrap_or(base.input_path),
            cleaned_path: self.cleaned_path.unwrap_or(base.cleaned_path),
            report_path: self.report_path.unwrap_or(base.report_path),
            plot_dir: self.plot_dir.or(base.plot_dir),
            steps_log_path: self.steps_log_path.or(base.steps_log_path),
            preview_columns: self.preview_columns.unwrap_or(base.preview_columns),
        };

        config.validate()?;
        Ok(config)
    }
}
