//! Report generation module.
//!
//! Writes the artifacts produced before cleaning: the text quality report,
//! the per-column summary table and the missingness export. Also saves the
//! cleaned dataset.
//!
//! # Example
//!
//! ```rust,ignore
//! use country_clean::quality::DataQualityAnalyzer;
//! use country_clean::reporting::ReportGenerator;
//!
//! let assessment = DataQualityAnalyzer::assess(&raw_df, &config.preview_columns)?;
//! let generator = ReportGenerator::new(config.report_path.clone(), config.summary_path());
//! generator.write_text_report(&assessment)?;
//! generator.write_summary_table(&assessment)?;
//! ```

mod generator;
mod missingness;

pub use generator::ReportGenerator;
pub use missingness::{
    CsvMissingnessSink, MISSING_COUNTS_FILE, MISSINGNESS_MATRIX_FILE, MissingnessMatrix,
    MissingnessSink,
};
