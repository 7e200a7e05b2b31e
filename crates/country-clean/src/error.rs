//! Error types for the cleaning pipeline.
//!
//! Load and report failures abort a run before any cleaning happens; cleaning
//! failures abort before the cleaned table is written. Nothing is retried.
//!
//! Errors are serializable so `--json` output can carry a stable code.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input file missing, unreadable or not parseable as CSV.
    #[error("Failed to load '{path}': {reason}")]
    Load { path: String, reason: String },

    /// Two raw column names normalize to the same canonical name.
    #[error("Columns '{first}' and '{second}' both normalize to '{canonical}'")]
    SchemaCollision {
        canonical: String,
        first: String,
        second: String,
    },

    /// A key column still holds text when quantiles are computed.
    #[error("Key column '{column}' is not numeric; cannot compute quantile bounds")]
    NonNumericKeyColumn { column: String },

    /// A stage returned a table with a different shape than it received.
    #[error("Stage '{stage}' changed table shape from {before:?} to {after:?}")]
    ShapeChanged {
        stage: String,
        before: (usize, usize),
        after: (usize, usize),
    },

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// The cleaned table could not be written.
    #[error("Failed to write cleaned data: {0}")]
    OutputWriteFailed(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LOAD_ERROR",
            Self::SchemaCollision { .. } => "SCHEMA_COLLISION",
            Self::NonNumericKeyColumn { .. } => "NON_NUMERIC_KEY_COLUMN",
            Self::ShapeChanged { .. } => "SHAPE_CHANGED",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::OutputWriteFailed(_) => "OUTPUT_WRITE_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// True for failures of the load/report step, which abort the run
    /// before any cleaning is attempted.
    pub fn is_fatal_before_cleaning(&self) -> bool {
        match self {
            Self::Load { .. } | Self::ReportGenerationFailed(_) => true,
            Self::WithContext { source, .. } => source.is_fatal_before_cleaning(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for PipelineError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        PipelineError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = PipelineError::SchemaCollision {
            canonical: "gdp".to_string(),
            first: "GDP".to_string(),
            second: "gdp ".to_string(),
        };
        assert_eq!(err.error_code(), "SCHEMA_COLLISION");
        assert_eq!(
            PipelineError::NonNumericKeyColumn {
                column: "gdp".to_string()
            }
            .error_code(),
            "NON_NUMERIC_KEY_COLUMN"
        );
    }

    #[test]
    fn test_fatal_before_cleaning() {
        let load = PipelineError::Load {
            path: "missing.csv".to_string(),
            reason: "not found".to_string(),
        };
        assert!(load.is_fatal_before_cleaning());
        assert!(PipelineError::ReportGenerationFailed("disk full".to_string())
            .is_fatal_before_cleaning());
        assert!(
            !PipelineError::NonNumericKeyColumn {
                column: "gdp".to_string()
            }
            .is_fatal_before_cleaning()
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = PipelineError::NonNumericKeyColumn {
            column: "population".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("NON_NUMERIC_KEY_COLUMN"));
        assert!(json.contains("population"));
    }

    #[test]
    fn test_with_context() {
        let error = PipelineError::Load {
            path: "a.csv".to_string(),
            reason: "bad".to_string(),
        }
        .with_context("During quality report");
        assert!(error.to_string().contains("During quality report"));
        assert_eq!(error.error_code(), "LOAD_ERROR"); // Preserves original code
        assert!(error.is_fatal_before_cleaning());
    }
}
