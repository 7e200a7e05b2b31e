//! Country Data Cleaning Library
//!
//! Data-quality reporting and a deterministic cleaning pipeline for
//! country-level indicator tables, built on Polars.
//!
//! # Overview
//!
//! - **Quality Report**: completeness, missing counts, column kinds and
//!   formatting issues of the raw table, as a text report and a summary CSV
//! - **Column Names**: raw labels rewritten to canonical `snake_case` names
//! - **Value Coercion**: `$`, `%` and `,` stripped; mostly numeric text
//!   columns committed as numeric
//! - **Missing Values**: explicit per-kind policy (sentinel label for text,
//!   left missing for numbers by default)
//! - **Outliers**: key-column values outside quantile bounds cleared
//! - **Validation**: unparseable or negative key-column values cleared
//!
//! No stage adds or removes rows or columns.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use country_clean::{Pipeline, PipelineConfig};
//!
//! // Full batch from files
//! let config = PipelineConfig::builder()
//!     .input_path("data/raw/world-data-2023.csv")
//!     .cleaned_path("data/cleaned/world_data_2023_cleaned.csv")
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! println!("Report: {}", result.report_path.display());
//!
//! // In memory
//! let cleaned = Pipeline::builder().build()?.clean(df)?;
//! println!("Outliers cleared: {}", cleaned.summary.total_outliers_removed());
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use country_clean::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .quantile_high(0.99)
//!     .quantile_low(0.01)
//!     .numeric_threshold(0.8)
//!     .key_columns(["population", "gdp"])
//!     .numeric_missing(MissingStrategy::FillWith(-1.0))
//!     .plot_dir("results/plots")
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{
    ColumnNameNormalizer, FillCounts, MissingValueHandler, ValueCoercer, normalize_column_name,
};
pub use config::{
    ConfigValidationError, MissingStrategy, MissingValuePolicy, PipelineConfig,
    PipelineConfigBuilder,
};
pub use error::{PipelineError, ResultExt};
pub use loader::TableLoader;
pub use pipeline::{
    ClosureProgressReporter, KeyColumnValidator, OutlierHandler, Pipeline, PipelineBuilder,
    PipelineStage, ProgressReporter, ProgressUpdate, StepLog, linear_quantile,
};
pub use quality::{DataQualityAnalyzer, QualityAssessment};
pub use reporting::{CsvMissingnessSink, MissingnessMatrix, MissingnessSink, ReportGenerator};
pub use types::{CleanedTable, CleaningSummary, ColumnKind, ColumnQuality, PipelineResult};
