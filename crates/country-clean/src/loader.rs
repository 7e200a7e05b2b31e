//! CSV loading.
//!
//! Reads the raw table with several fallback strategies, then casts every
//! column that is neither numeric nor string to string so the cleaning stages
//! only ever see the two column kinds they handle.

use crate::error::{PipelineError, Result};
use crate::types::ColumnKind;
use crate::utils::column_names;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Loads a delimited text file with a header row into a table.
pub struct TableLoader;

impl TableLoader {
    /// Load a CSV file.
    ///
    /// Fails with [`PipelineError::Load`] if the file is missing or no
    /// strategy can parse it.
    pub fn load(path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let load_error = |reason: String| PipelineError::Load {
            path: path.display().to_string(),
            reason,
        };

        if !path.is_file() {
            return Err(load_error("file not found".to_string()));
        }

        info!("Loading dataset from: {}", path.display());
        let df = Self::read_with_fallbacks(path).map_err(|e| load_error(e.to_string()))?;
        let df = Self::unify_column_kinds(df)?;
        info!("Dataset loaded successfully: {:?}", df.shape());
        Ok(df)
    }

    fn read_with_fallbacks(path: &Path) -> PolarsResult<DataFrame> {
        // Strategy 1: full schema inference
        match CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
        {
            Ok(df) => return Ok(df),
            Err(e) => debug!("Loading with schema inference failed: {}", e),
        }

        // Strategy 2: every column as string
        match CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
        {
            Ok(df) => return Ok(df),
            Err(e) => debug!("Loading as text failed: {}", e),
        }

        // Strategy 3: as text, replacing invalid UTF-8
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(CsvParseOptions::default().with_encoding(CsvEncoding::LossyUtf8))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
    }

    /// Cast columns that are neither numeric nor string (booleans, dates)
    /// to string.
    pub fn unify_column_kinds(mut df: DataFrame) -> Result<DataFrame> {
        for name in column_names(&df) {
            let column = df.column(&name)?;
            let dtype = column.dtype();
            if ColumnKind::from_dtype(dtype) == ColumnKind::Text && dtype != &DataType::String {
                debug!("Casting column '{}' from {} to str", name, dtype);
                let cast = column.cast(&DataType::String)?.take_materialized_series();
                df.replace(&name, cast)?;
            }
        }
        Ok(df)
    }
}
