//! Pipeline module.
//!
//! This module provides the cleaning pipeline, its key-column passes and
//! progress reporting.

mod builder;
pub mod outliers;
pub mod progress;
mod step_log;
pub mod validator;

pub use builder::{Pipeline, PipelineBuilder};
pub use outliers::{OutlierHandler, linear_quantile};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
pub use step_log::StepLog;
pub use validator::KeyColumnValidator;
