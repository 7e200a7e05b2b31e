//! Data quality analysis module.
//!
//! Measures completeness, column kinds and formatting issues of the raw
//! table. The result feeds the quality report and the summary table.

mod analyzer;

pub use analyzer::{DataQualityAnalyzer, PREVIEW_ROWS, QualityAssessment};
