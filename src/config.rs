//! Run Settings Module
//! Report settings loaded from an optional TOML file, overridable from the CLI.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Inclusive range of report years, each backed by a `total_cases_<year>` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSpan {
    pub first: i32,
    pub last: i32,
}

impl Default for YearSpan {
    fn default() -> Self {
        Self {
            first: 2013,
            last: 2017,
        }
    }
}

impl YearSpan {
    pub fn years(&self) -> Vec<i32> {
        (self.first..=self.last).collect()
    }

    pub fn column(year: i32) -> String {
        format!("total_cases_{}", year)
    }

    /// Count column names in year order.
    pub fn columns(&self) -> Vec<String> {
        self.years().into_iter().map(Self::column).collect()
    }
}

/// User settings for one report run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub years: YearSpan,
    pub top_n: usize,
    /// Year whose calendar maps MMWR weeks onto months.
    pub reference_year: i32,
    pub chart_width: u32,
    pub chart_height: u32,
    /// Fixed y-axis range for the monthly charts; auto-scaled when unset.
    pub monthly_y_range: Option<(i64, i64)>,
    pub render_charts: bool,
    pub drop_columns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("18_NNDSS.csv"),
            output_dir: PathBuf::from("report"),
            years: YearSpan::default(),
            top_n: 5,
            reference_year: 2013,
            chart_width: 1300,
            chart_height: 900,
            monthly_y_range: None,
            render_charts: true,
            drop_columns: default_drop_columns(),
        }
    }
}

/// NNDSS bookkeeping columns that carry nothing the report uses.
pub fn default_drop_columns() -> Vec<String> {
    let mut cols: Vec<String> = [
        "current_week",
        "current_week,_flag",
        "cum_2018",
        "cum_2018,_flag",
        "5-year_weekly_average§",
        "5-year_weekly_average§,_flag",
        "states_reporting_cases_during_current_week_no.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    cols.extend(
        (2013..=2017)
            .rev()
            .map(|y| format!("total_cases_reported_for_pervious_years_{},_flag", y)),
    );
    cols
}

impl Settings {
    /// Load settings from a TOML file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        if self.years.first > self.years.last {
            return Err(ConfigError::Invalid(format!(
                "first year {} is after last year {}",
                self.years.first, self.years.last
            )));
        }
        if self.chart_width == 0 || self.chart_height == 0 {
            return Err(ConfigError::Invalid("chart size must be non-zero".into()));
        }
        if let Some((lo, hi)) = self.monthly_y_range {
            if lo >= hi {
                return Err(ConfigError::Invalid(format!(
                    "monthly_y_range ({}, {}) is empty",
                    lo, hi
                )));
            }
        }
        Ok(())
    }
}
