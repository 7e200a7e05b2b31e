use crate::quality::QualityAssessment;
use anyhow::Result;
use chrono::Local;
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const RULE_WIDTH: usize = 60;
const SECTION_WIDTH: usize = 30;

/// Writes the quality report, the summary table and the cleaned dataset.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    report_path: PathBuf,
    summary_path: PathBuf,
}

impl ReportGenerator {
    pub fn new(report_path: PathBuf, summary_path: PathBuf) -> Self {
        Self {
            report_path,
            summary_path,
        }
    }

    /// Render the text report for an assessment.
    pub fn render_text_report(assessment: &QualityAssessment, generated_at: &str) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let section = "-".repeat(SECTION_WIDTH);
        let mut lines = vec![
            "GLOBAL COUNTRY DATASET - DATA QUALITY ASSESSMENT".to_string(),
            rule.clone(),
            format!("Analysis Date: {generated_at}"),
            "Purpose: Initial data exploration and quality assessment".to_string(),
            rule,
        ];

        lines.push("\nBASIC DATASET INFO".to_string());
        lines.push(section.clone());
        lines.push(format!("Countries: {} records", assessment.rows));
        lines.push(format!("Indicators: {} features", assessment.columns));
        lines.push(format!("Data points: {} total", assessment.data_points));
        lines.push(format!(
            "Completeness: {:.2}% ({:.2}% missing)",
            assessment.completeness_percentage,
            assessment.missing_percentage()
        ));
        let before = lines.len();
        lines.extend(
            assessment
                .columns_with_missing()
                .map(|c| format!("  ! {}: {} missing values", c.name, c.missing_count)),
        );
        if lines.len() == before {
            lines.push("No missing values detected.".to_string());
        }

        lines.push("\nCONTENT OVERVIEW".to_string());
        lines.push(section.clone());
        lines.push(format!("Text columns: {}", assessment.text_columns));
        lines.push(format!("Numeric columns: {}", assessment.numeric_columns));

        lines.push("\nDATA FORMAT ISSUES".to_string());
        lines.push(section.clone());
        if assessment.currency_columns.is_empty() && assessment.percent_columns.is_empty() {
            lines.push("No currency or percent formatting detected.".to_string());
        }
        for name in &assessment.currency_columns {
            lines.push(format!("  ! Currency symbols in column: {name}"));
        }
        for name in &assessment.percent_columns {
            lines.push(format!("  ! Percent signs in column: {name}"));
        }

        lines.push("\nSAMPLE DATA PREVIEW".to_string());
        lines.push(section.clone());
        match &assessment.preview {
            Some(preview) => lines.push(format!("Key columns preview:\n{preview}")),
            None => lines.push("Preview columns not available.".to_string()),
        }

        lines.push("\nNEXT STEPS RECOMMENDATIONS".to_string());
        lines.push(section);
        lines.push("1. Clean data format issues (remove $, %, commas)".to_string());
        lines.push("2. Handle missing values (strategy needed)".to_string());
        lines.push("3. Convert string columns to numeric".to_string());
        lines.push("4. Validate data ranges and outliers".to_string());

        let mut report = lines.join("\n");
        report.push('\n');
        report
    }

    /// Write the text report, creating parent directories.
    pub fn write_text_report(&self, assessment: &QualityAssessment) -> Result<PathBuf> {
        let generated_at = Local::now().format("%Y-%m-%d %H:%M").to_string();
        let report = Self::render_text_report(assessment, &generated_at);

        create_parent_dir(&self.report_path)?;
        let mut file = File::create(&self.report_path)?;
        file.write_all(report.as_bytes())?;

        info!("Report saved: {}", self.report_path.display());
        Ok(self.report_path.clone())
    }

    /// Per-column summary table: `Column, Data_Type, Missing_Count, Missing_Percent`.
    pub fn summary_table(assessment: &QualityAssessment) -> PolarsResult<DataFrame> {
        let quality = &assessment.column_quality;
        df![
            "Column" => quality.iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
            "Data_Type" => quality.iter().map(|c| c.dtype.clone()).collect::<Vec<_>>(),
            "Missing_Count" => quality.iter().map(|c| c.missing_count as u64).collect::<Vec<_>>(),
            "Missing_Percent" => quality
                .iter()
                .map(|c| format!("{:.2}%", c.missing_percentage))
                .collect::<Vec<_>>(),
        ]
    }

    /// Write the summary table as CSV next to the report.
    pub fn write_summary_table(&self, assessment: &QualityAssessment) -> Result<PathBuf> {
        let mut table = Self::summary_table(assessment)?;
        save_csv(&mut table, &self.summary_path)?;
        info!("Summary table saved: {}", self.summary_path.display());
        Ok(self.summary_path.clone())
    }

    /// Write the cleaned dataset as CSV.
    pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
        save_csv(df, path)?;
        info!("Dataset saved: {}", path.display());
        Ok(())
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub(crate) fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    create_parent_dir(path)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;
    Ok(())
}
