//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the load, report and cleaning workflow.

use crate::cleaner::{ColumnNameNormalizer, MissingValueHandler, ValueCoercer};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::loader::TableLoader;
use crate::pipeline::outliers::OutlierHandler;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::pipeline::step_log::StepLog;
use crate::pipeline::validator::KeyColumnValidator;
use crate::quality::DataQualityAnalyzer;
use crate::reporting::{CsvMissingnessSink, MissingnessMatrix, MissingnessSink, ReportGenerator};
use crate::types::{CleanedTable, CleaningSummary, PipelineResult};
use crate::utils::total_missing;
use polars::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The main cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use country_clean::{Pipeline, PipelineConfig};
///
/// // Full batch: load, report, clean, write
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().input_path("data/raw/world.csv").build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
///
/// // In memory, no files touched
/// let cleaned = Pipeline::builder().build()?.clean(dataframe)?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    missingness_sink: Option<Arc<dyn MissingnessSink>>,
    step_log: Option<StepLog>,
    reporter: ReportGenerator,
}

// Ensure Pipeline is Send (can be moved to another thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full batch: load, report, missingness export, clean and write.
    ///
    /// Load and report failures abort before cleaning; artifacts already
    /// written stay on disk.
    pub fn run(&self) -> Result<PipelineResult> {
        self.finish(self.run_internal(true))
    }

    /// Load the input and write the report artifacts without cleaning.
    pub fn run_report_only(&self) -> Result<PipelineResult> {
        self.finish(self.run_internal(false))
    }

    /// Clean a table in memory.
    ///
    /// Runs name normalization, value coercion, the missing-value policy, the
    /// outlier filter and key-column validation, in that order. Every stage
    /// must keep the table's shape.
    pub fn clean(&self, df: DataFrame) -> Result<CleanedTable> {
        let start_time = Instant::now();
        let shape = df.shape();
        info!("Cleaning table of {} rows x {} columns...", shape.0, shape.1);

        let mut summary = CleaningSummary {
            rows: shape.0,
            columns: shape.1,
            missing_before: total_missing(&df),
            ..Default::default()
        };
        let mut processing_steps = Vec::new();

        // Step 1: Column names
        self.stage_started(PipelineStage::NormalizingNames, "Formatting column names...");
        let (df, renamed) = ColumnNameNormalizer::normalize(df)?;
        check_shape(PipelineStage::NormalizingNames, shape, &df)?;
        processing_steps.push(format!(
            "Formatted column names ({} renamed)",
            renamed.len()
        ));
        summary.renamed_columns = renamed;

        // Step 2: Decorated values
        self.stage_started(PipelineStage::CoercingValues, "Cleaning row values...");
        let (df, coerced) = ValueCoercer::new(self.config.numeric_threshold).coerce(df)?;
        check_shape(PipelineStage::CoercingValues, shape, &df)?;
        if !coerced.is_empty() {
            debug!("Coerced columns: {:?}", coerced);
        }
        processing_steps.push(format!(
            "Converted {} text columns to numeric",
            coerced.len()
        ));
        summary.coerced_columns = coerced;

        // Step 3: Missing values
        self.stage_started(
            PipelineStage::HandlingMissingValues,
            "Handling missing values...",
        );
        let (mut df, fills) = MissingValueHandler::new(&self.config.missing_values).apply(df)?;
        check_shape(PipelineStage::HandlingMissingValues, shape, &df)?;
        processing_steps.push(format!(
            "Filled {} text and {} numeric missing cells",
            fills.text, fills.numeric
        ));
        summary.text_cells_filled = fills.text;
        summary.numeric_cells_filled = fills.numeric;

        summary.skipped_key_columns = self
            .config
            .key_columns
            .iter()
            .filter(|key| df.column(key.as_str()).is_err())
            .cloned()
            .collect();
        if !summary.skipped_key_columns.is_empty() {
            debug!(
                "Key columns not in table: {:?}",
                summary.skipped_key_columns
            );
        }

        // Step 4: Outliers
        self.stage_started(PipelineStage::FilteringOutliers, "Removing outliers...");
        let outliers = OutlierHandler::new(self.config.quantile_low, self.config.quantile_high)
            .filter(&mut df, &self.config.key_columns)?;
        check_shape(PipelineStage::FilteringOutliers, shape, &df)?;
        summary.outliers_removed = outliers;
        processing_steps.push(format!(
            "Removed {} outliers from {} key columns",
            summary.total_outliers_removed(),
            summary.outliers_removed.len()
        ));

        // Step 5: Validation
        self.stage_started(PipelineStage::Validating, "Validating key columns...");
        let invalid = KeyColumnValidator::validate(&mut df, &self.config.key_columns)?;
        check_shape(PipelineStage::Validating, shape, &df)?;
        summary.invalid_values_removed = invalid;
        processing_steps.push(format!(
            "Cleared {} invalid values in key columns",
            summary.total_invalid_values_removed()
        ));

        summary.missing_after = total_missing(&df);
        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Cleaning complete: {} -> {} missing cells in {}ms",
            summary.missing_before, summary.missing_after, summary.duration_ms
        );

        Ok(CleanedTable {
            data: df,
            summary,
            processing_steps,
        })
    }

    fn finish(&self, outcome: Result<PipelineResult>) -> Result<PipelineResult> {
        match outcome {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                self.append_step_log(&format!("Pipeline failed: {}", e));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn run_internal(&self, clean: bool) -> Result<PipelineResult> {
        let mut processing_steps = Vec::new();

        // Step 1: Load
        self.stage_started(PipelineStage::Loading, "Loading dataset...");
        let raw = TableLoader::load(&self.config.input_path)?;
        self.record_step(
            &mut processing_steps,
            format!(
                "Loaded {} rows x {} columns from {}",
                raw.height(),
                raw.width(),
                self.config.input_path.display()
            ),
        );

        // Step 2: Quality report and summary table
        self.stage_started(PipelineStage::QualityReport, "Generating data quality report...");
        let report_failed = |e: anyhow::Error| PipelineError::ReportGenerationFailed(e.to_string());
        let assessment = DataQualityAnalyzer::assess(&raw, &self.config.preview_columns)
            .map_err(|e| PipelineError::ReportGenerationFailed(e.to_string()))?;
        let report_path = self
            .reporter
            .write_text_report(&assessment)
            .map_err(report_failed)?;
        let summary_path = self
            .reporter
            .write_summary_table(&assessment)
            .map_err(report_failed)?;
        self.record_step(
            &mut processing_steps,
            format!("Data quality report generated at {}", report_path.display()),
        );

        // Step 3: Missingness export
        let plot_files = self.export_missingness(&raw, &mut processing_steps);

        let mut result = PipelineResult {
            input_path: self.config.input_path.clone(),
            report_path,
            summary_path,
            plot_files,
            cleaned_path: None,
            summary: None,
            processing_steps: Vec::new(),
        };

        if !clean {
            result.processing_steps = processing_steps;
            return Ok(result);
        }

        // Step 4: Clean
        let cleaned = self.clean(raw)?;
        for step in cleaned.processing_steps {
            self.record_step(&mut processing_steps, step);
        }

        // Step 5: Write
        self.stage_started(PipelineStage::WritingOutput, "Saving cleaned data...");
        let mut data = cleaned.data;
        ReportGenerator::save_dataset(&mut data, &self.config.cleaned_path)
            .map_err(|e| PipelineError::OutputWriteFailed(e.to_string()))?;
        self.record_step(
            &mut processing_steps,
            format!(
                "Cleaned data saved to {}",
                self.config.cleaned_path.display()
            ),
        );

        result.cleaned_path = Some(self.config.cleaned_path.clone());
        result.summary = Some(cleaned.summary);
        result.processing_steps = processing_steps;
        Ok(result)
    }

    /// Hand the missingness matrix to the sink. Failures are logged only.
    fn export_missingness(&self, raw: &DataFrame, steps: &mut Vec<String>) -> Vec<PathBuf> {
        let Some(sink) = &self.missingness_sink else {
            return Vec::new();
        };
        match sink.write(&MissingnessMatrix::from_dataframe(raw)) {
            Ok(files) => {
                self.record_step(
                    steps,
                    format!("Missingness data exported ({} files)", files.len()),
                );
                files
            }
            Err(e) => {
                warn!("Missingness export failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Keep a step for the result and append it to the step log.
    fn record_step(&self, steps: &mut Vec<String>, message: String) {
        info!("{}", message);
        self.append_step_log(&message);
        steps.push(message);
    }

    fn append_step_log(&self, message: &str) {
        if let Some(log) = &self.step_log
            && let Err(e) = log.append(message)
        {
            warn!("Failed to write step log {}: {}", log.path().display(), e);
        }
    }

    fn stage_started(&self, stage: PipelineStage, message: &str) {
        debug!("{}", message);
        self.report_progress(ProgressUpdate::new(stage, message));
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }
}

fn check_shape(stage: PipelineStage, before: (usize, usize), df: &DataFrame) -> Result<()> {
    let after = df.shape();
    if after != before {
        return Err(PipelineError::ShapeChanged {
            stage: stage.display_name().to_string(),
            before,
            after,
        });
    }
    Ok(())
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    missingness_sink: Option<Arc<dyn MissingnessSink>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set the sink that receives the raw table's missingness matrix.
    ///
    /// Overrides the CSV export configured through `plot_dir`.
    pub fn missingness_sink(mut self, sink: Arc<dyn MissingnessSink>) -> Self {
        self.missingness_sink = Some(sink);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, crate::config::ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let reporter = ReportGenerator::new(config.report_path.clone(), config.summary_path());
        let missingness_sink = self.missingness_sink.or_else(|| {
            config
                .plot_dir
                .as_ref()
                .map(|dir| Arc::new(CsvMissingnessSink::new(dir.clone())) as Arc<dyn MissingnessSink>)
        });
        let step_log = config.steps_log_path.as_ref().map(StepLog::new);

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            missingness_sink,
            step_log,
            reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MissingStrategy, UNKNOWN_LABEL};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn raw_table() -> DataFrame {
        df![
            "Country" => ["A", "B", "C", "D", "E", "F"],
            "GDP" => ["$1,000", "$2,000", "$1,000,000", "$3,000", "$4,000", "$5"],
            "Population" => [1i64, 2, 1000, 3, 4, -1000],
            "Capital/Major City" => [Some(" Kabul "), None, Some("Andorra la Vella"), None, Some("Luanda"), Some("Tirana")],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.missingness_sink.is_none());
        assert!(pipeline.step_log.is_none());
        assert_eq!(pipeline.config().key_columns.len(), 11);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            quantile_low: 0.9,
            quantile_high: 0.1,
            ..Default::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_plot_dir_enables_csv_sink() {
        let config = PipelineConfig::builder().plot_dir("plots").build().unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();
        assert!(pipeline.missingness_sink.is_some());
    }

    #[test]
    fn test_clean_end_to_end() {
        let pipeline = Pipeline::builder().build().unwrap();
        let cleaned = pipeline.clean(raw_table()).unwrap();
        let df = &cleaned.data;

        assert_eq!(df.shape(), (6, 4));
        assert_eq!(
            crate::utils::column_names(df),
            vec!["country", "gdp", "population", "capital_major_city"]
        );
        assert_eq!(df.column("gdp").unwrap().dtype(), &DataType::Float64);

        // population: the two extremes are cleared by the outlier filter
        let population: Vec<Option<f64>> = df
            .column("population")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            population,
            vec![Some(1.0), Some(2.0), None, Some(3.0), Some(4.0), None]
        );

        let capitals: Vec<Option<&str>> = df
            .column("capital_major_city")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(capitals[0], Some("Kabul"));
        assert_eq!(capitals[1], Some(UNKNOWN_LABEL));

        let summary = &cleaned.summary;
        assert_eq!(summary.rows, 6);
        assert_eq!(summary.coerced_columns, vec!["gdp"]);
        assert_eq!(summary.text_cells_filled, 2);
        assert_eq!(summary.outliers_removed.get("population"), Some(&2));
        assert_eq!(summary.outliers_removed.get("gdp"), Some(&2));
        assert!(summary.skipped_key_columns.contains(&"land_area_km2".to_string()));
        assert_eq!(cleaned.processing_steps.len(), 5);
    }

    #[test]
    fn test_clean_reports_progress_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&stages);
        let pipeline = Pipeline::builder()
            .on_progress(move |update| seen.lock().unwrap().push(update.stage))
            .build()
            .unwrap();

        pipeline.clean(raw_table()).unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                PipelineStage::NormalizingNames,
                PipelineStage::CoercingValues,
                PipelineStage::HandlingMissingValues,
                PipelineStage::FilteringOutliers,
                PipelineStage::Validating,
            ]
        );
    }

    #[test]
    fn test_clean_rejects_collisions() {
        let df = df!["GDP" => [1.0], "gdp" => [2.0]].unwrap();
        let err = Pipeline::builder().build().unwrap().clean(df).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_COLLISION");
    }

    #[test]
    fn test_clean_with_numeric_fill() {
        let config = PipelineConfig::builder()
            .key_columns(Vec::<String>::new())
            .numeric_missing(MissingStrategy::FillWith(-1.0))
            .build()
            .unwrap();
        let df = df!["value" => [None, Some(5.0)]].unwrap();

        let cleaned = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .clean(df)
            .unwrap();
        assert_eq!(cleaned.summary.numeric_cells_filled, 1);
        assert_eq!(cleaned.summary.missing_after, 0);
    }

    #[test]
    fn test_failing_sink_is_not_fatal() {
        struct BrokenSink;
        impl MissingnessSink for BrokenSink {
            fn write(&self, _matrix: &MissingnessMatrix) -> anyhow::Result<Vec<PathBuf>> {
                anyhow::bail!("no display available")
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        std::fs::write(&input, "Country,GDP\nA,\"$1,000\"\nB,\"$2,000\"\n").unwrap();

        let config = PipelineConfig::builder()
            .input_path(&input)
            .cleaned_path(dir.path().join("clean.csv"))
            .report_path(dir.path().join("report.txt"))
            .build()
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let result = Pipeline::builder()
            .config(config)
            .missingness_sink(Arc::new(BrokenSink))
            .on_progress(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert!(result.plot_files.is_empty());
        assert!(result.cleaned_path.unwrap().exists());
        assert!(calls.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_check_shape() {
        let df = df!["a" => [1, 2]].unwrap();
        assert!(check_shape(PipelineStage::Validating, (2, 1), &df).is_ok());

        let err = check_shape(PipelineStage::Validating, (3, 1), &df).unwrap_err();
        assert_eq!(err.error_code(), "SHAPE_CHANGED");
        assert!(err.to_string().contains("Validating Key Columns"));
    }
}
