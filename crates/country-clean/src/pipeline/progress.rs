//! Progress reporting for the cleaning pipeline.
//!
//! The pipeline emits a [`ProgressUpdate`] when each stage starts and once it
//! finishes or fails. The CLI uses this to drive its log output; library
//! callers can hook in with [`Pipeline::builder().on_progress`].
//!
//! # Example
//!
//! ```rust,ignore
//! use country_clean::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```
//!
//! [`Pipeline::builder().on_progress`]: crate::PipelineBuilder::on_progress

use serde::{Deserialize, Serialize};

/// Stages of the cleaning pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading the raw CSV
    Loading,
    /// Writing the data quality report, summary table and missingness output
    QualityReport,
    /// Rewriting column names to canonical form
    NormalizingNames,
    /// Stripping decorations and committing numeric columns
    CoercingValues,
    /// Applying the missing-value policy
    HandlingMissingValues,
    /// Clearing key-column values outside quantile bounds
    FilteringOutliers,
    /// Clearing invalid key-column values
    Validating,
    /// Writing the cleaned CSV
    WritingOutput,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::QualityReport => "Assessing Quality",
            Self::NormalizingNames => "Formatting Column Names",
            Self::CoercingValues => "Coercing Values",
            Self::HandlingMissingValues => "Handling Missing Values",
            Self::FilteringOutliers => "Removing Outliers",
            Self::Validating => "Validating Key Columns",
            Self::WritingOutput => "Saving Cleaned Data",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run taken by this stage (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.10,
            Self::QualityReport => 0.20,
            Self::NormalizingNames => 0.05,
            Self::CoercingValues => 0.20,
            Self::HandlingMissingValues => 0.10,
            Self::FilteringOutliers => 0.15,
            Self::Validating => 0.10,
            Self::WritingOutput => 0.10,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::QualityReport => 0.10,
            Self::NormalizingNames => 0.30,
            Self::CoercingValues => 0.35,
            Self::HandlingMissingValues => 0.55,
            Self::FilteringOutliers => 0.65,
            Self::Validating => 0.80,
            Self::WritingOutput => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Update for the start of `stage`.
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.base_progress(),
            message: message.into(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates from the pipeline.
///
/// Implementations must be `Send + Sync` so a pipeline running on a worker
/// thread can report to the caller.
pub trait ProgressReporter: Send + Sync {
    /// Called at stage boundaries. Should return quickly.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const RUN_STAGES: [PipelineStage; 8] = [
        PipelineStage::Loading,
        PipelineStage::QualityReport,
        PipelineStage::NormalizingNames,
        PipelineStage::CoercingValues,
        PipelineStage::HandlingMissingValues,
        PipelineStage::FilteringOutliers,
        PipelineStage::Validating,
        PipelineStage::WritingOutput,
    ];

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(PipelineStage::CoercingValues, "Cleaning row values...");
        assert_eq!(update.stage, PipelineStage::CoercingValues);
        assert!((update.progress - 0.35).abs() < 1e-6);
        assert_eq!(update.message, "Cleaning row values...");
    }

    #[test]
    fn test_progress_update_terminal_states() {
        let done = ProgressUpdate::complete("done");
        assert_eq!(done.stage, PipelineStage::Complete);
        assert_eq!(done.progress, 1.0);

        let failed = ProgressUpdate::failed("boom");
        assert_eq!(failed.stage, PipelineStage::Failed);
        assert_eq!(failed.message, "boom");
    }

    #[test]
    fn test_stage_weights_sum_to_one() {
        let total: f32 = RUN_STAGES.iter().map(|s| s.weight()).sum();
        assert!((total - 1.0).abs() < 1e-5, "weights sum to {}", total);
    }

    #[test]
    fn test_base_progress_is_cumulative() {
        let mut expected = 0.0f32;
        for stage in RUN_STAGES {
            assert!(
                (stage.base_progress() - expected).abs() < 1e-5,
                "{:?} starts at {} not {}",
                stage,
                stage.base_progress(),
                expected
            );
            expected += stage.weight();
        }
    }

    #[test]
    fn test_closure_progress_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ClosureProgressReporter::new(move |update: ProgressUpdate| {
            sink.lock().unwrap().push(update.stage);
        });

        reporter.report(ProgressUpdate::new(PipelineStage::Loading, "start"));
        reporter.report(ProgressUpdate::complete("done"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![PipelineStage::Loading, PipelineStage::Complete]
        );
    }

    #[test]
    fn test_stage_json_values() {
        assert_eq!(
            serde_json::to_string(&PipelineStage::HandlingMissingValues).unwrap(),
            "\"handling_missing_values\""
        );
        let json =
            serde_json::to_string(&ProgressUpdate::new(PipelineStage::Loading, "Loading")).unwrap();
        assert!(json.contains("\"stage\":\"loading\""));
    }
}
