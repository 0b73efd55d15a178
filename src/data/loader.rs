//! CSV Data Loader Module
//! Loads the NNDSS export with Polars and normalizes its column headers.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),
}

/// Handles CSV file loading with Polars.
pub struct DataLoader {
    file_path: PathBuf,
}

impl DataLoader {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Load the CSV. Cells that fail to parse become nulls.
    pub fn load_csv(&self) -> Result<DataFrame, LoaderError> {
        if !self.file_path.exists() {
            return Err(LoaderError::NotFound(self.file_path.clone()));
        }

        let df = LazyCsvReader::new(&self.file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .with_encoding(CsvEncoding::LossyUtf8)
            .finish()?
            .collect()?;

        info!(
            path = %self.file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded CSV"
        );
        Ok(df)
    }
}

/// Normalize a raw header: trim, lowercase, collapse double spaces,
/// spaces to underscores, parentheses removed.
pub fn normalize_header(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace("  ", " ")
        .replace(' ', "_")
        .replace(['(', ')'], "")
}

/// Rename every column of the frame to its normalized header.
pub fn normalize_columns(df: &mut DataFrame) -> PolarsResult<()> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for name in names {
        let normalized = normalize_header(&name);
        if normalized != name {
            debug!(from = %name, to = %normalized, "renaming column");
            df.rename(&name, normalized.into())?;
        }
    }
    Ok(())
}
