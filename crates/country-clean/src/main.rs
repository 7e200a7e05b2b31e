//! CLI entry point for the country data cleaning pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use country_clean::{
    MissingStrategy, Pipeline, PipelineConfig, PipelineConfigBuilder, PipelineResult,
};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Data quality report and cleaning pipeline for country indicator tables",
    long_about = "Loads a country-level CSV, writes a data quality report and summary table,\n\
                  then cleans the table and writes the result.\n\n\
                  EXAMPLES:\n  \
                  # Defaults (data/raw/world-data-2023.csv)\n  \
                  country-clean\n\n  \
                  # Custom input and output\n  \
                  country-clean -i raw.csv -o cleaned.csv --report reports/quality.txt\n\n  \
                  # Report only, with missingness data for plotting\n  \
                  country-clean --report-only --plot-dir results/plots"
)]
struct Args {
    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raw CSV to clean
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the cleaned CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Where to write the text quality report
    ///
    /// The summary table is written next to it as <name>_summary.csv
    #[arg(long)]
    report: Option<PathBuf>,

    /// Directory for missingness plot data
    #[arg(long)]
    plot_dir: Option<PathBuf>,

    /// Append pipeline steps to this log file
    #[arg(long)]
    steps_log: Option<PathBuf>,

    /// Upper quantile for outlier filtering (0.0 - 1.0)
    #[arg(long)]
    quantile_high: Option<f64>,

    /// Lower quantile for outlier filtering (0.0 - 1.0)
    #[arg(long)]
    quantile_low: Option<f64>,

    /// Share of parseable cells needed to make a text column numeric (0.0 - 1.0)
    #[arg(long)]
    numeric_threshold: Option<f64>,

    /// Comma-separated canonical key column names
    #[arg(long, value_delimiter = ',')]
    key_columns: Option<Vec<String>>,

    /// Fill missing numeric cells with this value
    #[arg(long)]
    numeric_fill: Option<f64>,

    /// Fill missing text cells with this label
    #[arg(long, conflicts_with = "no_text_fill")]
    text_fill: Option<String>,

    /// Leave missing text cells missing
    #[arg(long)]
    no_text_fill: bool,

    /// Only write the quality report, summary table and missingness data
    #[arg(long)]
    report_only: bool,

    /// Output the run result as JSON to stdout
    ///
    /// Disables all logging.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables (RUST_LOG) before the filter is built
    dotenv().ok();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    debug!("Configuration: {:?}", config);

    let pipeline = Pipeline::builder()
        .config(config)
        .on_progress(|update| {
            debug!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        })
        .build()?;

    let result = if args.report_only {
        pipeline.run_report_only()
    } else {
        pipeline.run()
    };

    let result = match result {
        Ok(result) => result,
        Err(e) if args.json => {
            println!("{}", serde_json::to_string_pretty(&e)?);
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !args.quiet {
        print_human_readable_summary(&result);
    }

    Ok(())
}

/// Merge the config file (or defaults) with command line overrides.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let base = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let mut builder = PipelineConfigBuilder::from_config(base);

    if let Some(path) = &args.input {
        builder = builder.input_path(path);
    }
    if let Some(path) = &args.output {
        builder = builder.cleaned_path(path);
    }
    if let Some(path) = &args.report {
        builder = builder.report_path(path);
    }
    if let Some(dir) = &args.plot_dir {
        builder = builder.plot_dir(dir);
    }
    if let Some(path) = &args.steps_log {
        builder = builder.steps_log_path(path);
    }
    if let Some(q) = args.quantile_high {
        builder = builder.quantile_high(q);
    }
    if let Some(q) = args.quantile_low {
        builder = builder.quantile_low(q);
    }
    if let Some(threshold) = args.numeric_threshold {
        builder = builder.numeric_threshold(threshold);
    }
    if let Some(columns) = &args.key_columns {
        builder = builder.key_columns(columns.iter().map(|c| c.trim()));
    }
    if let Some(value) = args.numeric_fill {
        builder = builder.numeric_missing(MissingStrategy::FillWith(value));
    }
    if args.no_text_fill {
        builder = builder.text_missing(MissingStrategy::LeaveMissing);
    } else if let Some(label) = &args.text_fill {
        builder = builder.text_missing(MissingStrategy::FillWith(label.clone()));
    }

    Ok(builder.build()?)
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` intentionally: this is the command's output, not logging.
fn print_human_readable_summary(result: &PipelineResult) {
    println!();
    println!("{}", "=".repeat(80));
    if result.summary.is_some() {
        println!("CLEANING COMPLETE");
    } else {
        println!("QUALITY REPORT COMPLETE");
    }
    println!("{}", "=".repeat(80));
    println!();

    println!("Input:   {}", result.input_path.display());
    println!("Report:  {}", result.report_path.display());
    println!("Summary: {}", result.summary_path.display());
    for file in &result.plot_files {
        println!("Plot data: {}", file.display());
    }
    if let Some(cleaned) = &result.cleaned_path {
        println!("Output:  {}", cleaned.display());
    }
    println!();

    if let Some(summary) = &result.summary {
        println!("Cleaning Summary:");
        println!("  Duration: {}ms", summary.duration_ms);
        println!("  Shape: {} rows x {} columns", summary.rows, summary.columns);
        println!("  Columns renamed: {}", summary.renamed_columns.len());
        println!("  Columns made numeric: {}", summary.coerced_columns.len());
        println!(
            "  Cells filled: {} text, {} numeric",
            summary.text_cells_filled, summary.numeric_cells_filled
        );
        println!("  Outliers cleared: {}", summary.total_outliers_removed());
        println!(
            "  Invalid values cleared: {}",
            summary.total_invalid_values_removed()
        );
        println!(
            "  Missing cells: {} -> {}",
            summary.missing_before, summary.missing_after
        );
        if !summary.skipped_key_columns.is_empty() {
            println!(
                "  Key columns not found: {}",
                summary.skipped_key_columns.join(", ")
            );
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
