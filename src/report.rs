//! Report Writer Module
//! Writes the JSON summary and CSV exports of a run.

use crate::config::Settings;
use crate::data::CleaningReport;
use crate::stats::{DiseaseTotal, MonthlyCases, WeeklyStats};
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const SUMMARY_FILE: &str = "summary.json";
pub const CLEANED_FILE: &str = "cleaned.csv";
pub const TOTALS_FILE: &str = "disease_totals.csv";
pub const MONTHLY_FILE: &str = "monthly_totals.csv";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a run found, as written to `summary.json`.
#[derive(Debug, Serialize)]
pub struct ReportSummary<'a> {
    pub settings: &'a Settings,
    pub cleaning: &'a CleaningReport,
    pub weeks_without_month: usize,
    pub top_diseases: &'a [DiseaseTotal],
    pub monthly: &'a [MonthlyCases],
    pub weekly_stats: &'a [WeeklyStats],
}

/// Frames exported as CSV next to the summary.
pub struct ReportFrames<'a> {
    pub cleaned: &'a DataFrame,
    pub totals: &'a DataFrame,
    pub monthly: &'a DataFrame,
}

/// Writes report files into one output directory.
pub struct ReportWriter {
    out_dir: PathBuf,
}

impl ReportWriter {
    /// Creates the output directory if needed.
    pub fn new(out_dir: &Path) -> Result<Self, ReportError> {
        fs::create_dir_all(out_dir).map_err(|source| ReportError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn create(&self, name: &str) -> Result<(PathBuf, BufWriter<File>), ReportError> {
        let path = self.out_dir.join(name);
        let file = File::create(&path).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok((path, BufWriter::new(file)))
    }

    fn flush(path: PathBuf, mut writer: BufWriter<File>) -> Result<PathBuf, ReportError> {
        writer.flush().map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    pub fn write_summary(&self, summary: &ReportSummary) -> Result<PathBuf, ReportError> {
        let (path, mut writer) = self.create(SUMMARY_FILE)?;
        serde_json::to_writer_pretty(&mut writer, summary)?;
        Self::flush(path, writer)
    }

    pub fn write_csv(&self, name: &str, df: &DataFrame) -> Result<PathBuf, ReportError> {
        let (path, mut writer) = self.create(name)?;
        let mut df = df.clone();
        CsvWriter::new(&mut writer)
            .include_header(true)
            .finish(&mut df)?;
        Self::flush(path, writer)
    }

    /// Write the summary and all CSV exports; returns the written paths.
    pub fn write_all(
        &self,
        summary: &ReportSummary,
        frames: &ReportFrames,
    ) -> Result<Vec<PathBuf>, ReportError> {
        let written = vec![
            self.write_summary(summary)?,
            self.write_csv(CLEANED_FILE, frames.cleaned)?,
            self.write_csv(TOTALS_FILE, frames.totals)?,
            self.write_csv(MONTHLY_FILE, frames.monthly)?,
        ];
        info!(files = written.len(), dir = %self.out_dir.display(), "wrote report files");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_csv_includes_header() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(&dir.path().join("nested")).unwrap();
        let df = df!("disease" => ["Listeriosis"], "case_total" => [47i64]).unwrap();

        let path = writer.write_csv(TOTALS_FILE, &df).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["disease,case_total", "Listeriosis,47"]);
    }

    #[test]
    fn write_summary_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();
        let settings = Settings::default();
        let cleaning = CleaningReport::default();
        let totals = vec![DiseaseTotal {
            disease: "Listeriosis".into(),
            yearly: vec![1, 2, 3, 4, 5],
            case_total: 15,
        }];
        let summary = ReportSummary {
            settings: &settings,
            cleaning: &cleaning,
            weeks_without_month: 0,
            top_diseases: &totals,
            monthly: &[],
            weekly_stats: &[],
        };

        let path = writer.write_summary(&summary).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["top_diseases"][0]["case_total"], 15);
        assert_eq!(value["settings"]["top_n"], 5);
    }
}
