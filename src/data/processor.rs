//! Data Processor Module
//! Cleans the normalized NNDSS frame into disease-week records.

use crate::config::YearSpan;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub const DISEASE_COL: &str = "disease";
pub const WEEK_COL: &str = "mmwr_week";

/// Substring shortened out of the previous-years count headers.
const PREVIOUS_YEARS_INFIX: &str = "_reported_for_pervious_years_";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Required column '{0}' is missing")]
    MissingColumn(String),
}

/// Row counts and nulls filled across the cleaning steps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    pub rows_loaded: usize,
    pub dropped_columns: Vec<String>,
    pub null_disease_rows: usize,
    pub nulls_filled: Vec<(String, usize)>,
    pub duplicates_removed: usize,
    pub zero_rows_removed: usize,
    pub rows_clean: usize,
}

/// Handles data cleaning operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Run every cleaning step in order on a header-normalized frame.
    pub fn clean(
        df: DataFrame,
        years: &YearSpan,
        drop_columns: &[String],
    ) -> Result<(DataFrame, CleaningReport), ProcessorError> {
        let mut report = CleaningReport {
            rows_loaded: df.height(),
            ..Default::default()
        };

        let (df, dropped) = Self::drop_columns(&df, drop_columns)?;
        report.dropped_columns = dropped;

        let df = Self::strip_non_ascii(df)?;
        let df = Self::rename_and_reorder(df, years)?;

        let before = df.height();
        let (df, nulls_filled) = Self::fill_nulls(df, years)?;
        report.null_disease_rows = before - df.height();
        report.nulls_filled = nulls_filled;

        let before = df.height();
        let df = Self::drop_duplicates(df)?;
        report.duplicates_removed = before - df.height();

        let before = df.height();
        let df = Self::filter_zero_rows(df, years)?;
        report.zero_rows_removed = before - df.height();

        let df = Self::trim_disease(df)?;
        report.rows_clean = df.height();

        info!(
            rows_loaded = report.rows_loaded,
            duplicates = report.duplicates_removed,
            zero_rows = report.zero_rows_removed,
            rows_clean = report.rows_clean,
            "cleaned frame"
        );
        Ok((df, report))
    }

    /// Drop the listed columns that are present; returns the names actually dropped.
    pub fn drop_columns(
        df: &DataFrame,
        drop: &[String],
    ) -> Result<(DataFrame, Vec<String>), ProcessorError> {
        let (dropped, keep): (Vec<String>, Vec<String>) = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .partition(|name| drop.contains(name));

        debug!(?dropped, "dropping columns");
        Ok((df.select(keep)?, dropped))
    }

    /// Replace control, non-ASCII and `*` characters in disease names by a space.
    pub fn sanitize_disease(name: &str) -> String {
        name.chars()
            .map(|c| {
                let code = c as u32;
                if !(32..=126).contains(&code) || c == '*' {
                    ' '
                } else {
                    c
                }
            })
            .collect()
    }

    pub fn strip_non_ascii(df: DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::map_disease(df, Self::sanitize_disease)
    }

    /// Shorten the count headers and keep `[disease, mmwr_week, total_cases_<year>..]`.
    pub fn rename_and_reorder(
        mut df: DataFrame,
        years: &YearSpan,
    ) -> Result<DataFrame, ProcessorError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for name in names.iter().filter(|n| n.contains(PREVIOUS_YEARS_INFIX)) {
            let short = name.replace(PREVIOUS_YEARS_INFIX, "_");
            df.rename(name, short.into())?;
        }

        let mut order = vec![DISEASE_COL.to_string(), WEEK_COL.to_string()];
        order.extend(years.columns());

        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(missing) = order.iter().find(|c| !present.contains(c)) {
            return Err(ProcessorError::MissingColumn(missing.clone()));
        }

        Ok(df.select(order)?)
    }

    /// Cast week and counts to integers and fill their nulls with 0.
    /// Rows without a disease name are dropped.
    pub fn fill_nulls(
        df: DataFrame,
        years: &YearSpan,
    ) -> Result<(DataFrame, Vec<(String, usize)>), ProcessorError> {
        let mut numeric = vec![WEEK_COL.to_string()];
        numeric.extend(years.columns());

        let casts: Vec<Expr> = numeric
            .iter()
            .map(|c| col(c.as_str()).cast(DataType::Int64))
            .collect();
        let df = df
            .lazy()
            .with_column(col(DISEASE_COL).cast(DataType::String))
            .filter(col(DISEASE_COL).is_not_null())
            .with_columns(casts)
            .collect()?;

        let mut nulls = Vec::with_capacity(numeric.len());
        for name in &numeric {
            nulls.push((name.clone(), df.column(name)?.null_count()));
        }

        let fills: Vec<Expr> = numeric
            .iter()
            .map(|c| col(c.as_str()).fill_null(lit(0i64)))
            .collect();
        let df = df.lazy().with_columns(fills).collect()?;

        debug!(?nulls, "filled nulls");
        Ok((df, nulls))
    }

    /// Remove exact duplicate rows, keeping the first and the original order.
    pub fn drop_duplicates(df: DataFrame) -> Result<DataFrame, ProcessorError> {
        Ok(df
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?)
    }

    /// Keep rows with a positive count in at least one year. The source
    /// notebook wrote `a | b | c | (d & e)`, a precedence slip for an OR of all years.
    pub fn filter_zero_rows(df: DataFrame, years: &YearSpan) -> Result<DataFrame, ProcessorError> {
        let any_cases = years
            .columns()
            .iter()
            .map(|c| col(c.as_str()).gt(lit(0i64)))
            .reduce(|a, b| a.or(b))
            .unwrap_or_else(|| lit(false));

        Ok(df.lazy().filter(any_cases).collect()?)
    }

    pub fn trim_disease(df: DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::map_disease(df, |s| s.trim().to_string())
    }

    fn map_disease(
        mut df: DataFrame,
        f: impl Fn(&str) -> String,
    ) -> Result<DataFrame, ProcessorError> {
        let disease = df
            .column(DISEASE_COL)
            .map_err(|_| ProcessorError::MissingColumn(DISEASE_COL.to_string()))?
            .cast(&DataType::String)?;

        let values: Vec<Option<String>> = disease.str()?.into_iter().map(|v| v.map(&f)).collect();

        df.with_column(Column::new(DISEASE_COL.into(), values))?;
        Ok(df)
    }
}
