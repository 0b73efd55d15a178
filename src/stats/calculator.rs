//! Aggregation Calculator Module
//! Sums case counts by disease and by month, ranks the top diseases and
//! computes weekly descriptive statistics.

use crate::config::YearSpan;
use crate::data::{DISEASE_COL, WEEK_COL};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, Min};
use thiserror::Error;
use tracing::{debug, warn};

pub const CASE_TOTAL_COL: &str = "case_total";
pub const MONTH_COL: &str = "month";

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Top-N count must be at least 1")]
    EmptyRanking,
}

/// Summed cases for one disease across all weeks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseTotal {
    pub disease: String,
    /// One entry per report year, in year order.
    pub yearly: Vec<i64>,
    pub case_total: i64,
}

/// Summed cases for one disease within one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCases {
    pub month: u32,
    pub disease: String,
    pub yearly: Vec<i64>,
}

/// Descriptive statistics of one disease's weekly counts in one year.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyStats {
    pub disease: String,
    pub year: i32,
    pub weeks: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub peak_week: Option<i64>,
}

/// Month of the MMWR week, taking day `week * 7 - 6` of the reference year.
pub fn month_of_week(week: i64, reference_year: i32) -> Option<u32> {
    if !(1..=53).contains(&week) {
        return None;
    }
    let ordinal = (week * 7 - 6) as u32;
    NaiveDate::from_yo_opt(reference_year, ordinal).map(|d| d.month())
}

/// Handles aggregation over cleaned disease-week frames.
pub struct StatsCalculator;

impl StatsCalculator {
    fn year_sums(years: &YearSpan) -> Vec<Expr> {
        years
            .columns()
            .iter()
            .map(|c| col(c.as_str()).sum())
            .collect()
    }

    /// Sum every year column per disease and add `case_total`.
    pub fn sum_by_disease(df: &DataFrame, years: &YearSpan) -> Result<DataFrame, AggregateError> {
        let total = years
            .columns()
            .iter()
            .map(|c| col(c.as_str()))
            .reduce(|a, b| a + b)
            .unwrap_or_else(|| lit(0i64));

        let sums = df
            .clone()
            .lazy()
            .group_by_stable([col(DISEASE_COL)])
            .agg(Self::year_sums(years))
            .with_column(total.alias(CASE_TOTAL_COL))
            .collect()?;

        debug!(diseases = sums.height(), "summed cases by disease");
        Ok(sums)
    }

    /// Highest `case_total` first, ties by disease name; keeps at most `n` rows.
    pub fn rank_top_n(totals: &DataFrame, n: usize) -> Result<DataFrame, AggregateError> {
        if n == 0 {
            return Err(AggregateError::EmptyRanking);
        }

        Ok(totals
            .clone()
            .lazy()
            .sort_by_exprs(
                [col(CASE_TOTAL_COL), col(DISEASE_COL)],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .limit(n as IdxSize)
            .collect()?)
    }

    /// Replace `mmwr_week` by `month`; rows whose week has no month are
    /// dropped. Returns the frame and the number of dropped rows.
    pub fn with_month(
        df: &DataFrame,
        years: &YearSpan,
        reference_year: i32,
    ) -> Result<(DataFrame, usize), AggregateError> {
        let months: Vec<Option<u32>> = df
            .column(WEEK_COL)?
            .i64()?
            .into_iter()
            .map(|w| w.and_then(|w| month_of_week(w, reference_year)))
            .collect();
        let skipped = months.iter().filter(|m| m.is_none()).count();
        if skipped > 0 {
            warn!(rows = skipped, "rows with an MMWR week outside 1..=53 have no month");
        }

        let mut order = vec![col(DISEASE_COL), col(MONTH_COL)];
        order.extend(years.columns().iter().map(|c| col(c.as_str())));

        let mut df = df.clone();
        df.with_column(Column::new(MONTH_COL.into(), months))?;
        let df = df
            .lazy()
            .filter(col(MONTH_COL).is_not_null())
            .select(order)
            .collect()?;
        Ok((df, skipped))
    }

    /// Keep rows whose disease is one of `diseases`.
    pub fn filter_diseases(df: &DataFrame, diseases: &[String]) -> Result<DataFrame, AggregateError> {
        let Some(predicate) = diseases
            .iter()
            .map(|d| col(DISEASE_COL).eq(lit(d.as_str())))
            .reduce(|a, b| a.or(b))
        else {
            return Ok(df.clear());
        };

        Ok(df.clone().lazy().filter(predicate).collect()?)
    }

    /// Sum year columns per (month, disease), ordered by month then disease.
    pub fn sum_by_month(df: &DataFrame, years: &YearSpan) -> Result<DataFrame, AggregateError> {
        Ok(df
            .clone()
            .lazy()
            .group_by([col(MONTH_COL), col(DISEASE_COL)])
            .agg(Self::year_sums(years))
            .sort_by_exprs(
                [col(MONTH_COL), col(DISEASE_COL)],
                SortMultipleOptions::default(),
            )
            .collect()?)
    }

    /// Read a disease-total frame into rows.
    pub fn disease_totals(df: &DataFrame, years: &YearSpan) -> Result<Vec<DiseaseTotal>, AggregateError> {
        let diseases = df.column(DISEASE_COL)?.str()?;
        let totals = df.column(CASE_TOTAL_COL)?.i64()?;
        let yearly = Self::year_values(df, years)?;

        Ok((0..df.height())
            .map(|i| DiseaseTotal {
                disease: diseases.get(i).unwrap_or_default().to_string(),
                yearly: yearly.iter().map(|v| v[i]).collect(),
                case_total: totals.get(i).unwrap_or(0),
            })
            .collect())
    }

    /// Read a month/disease frame into rows.
    pub fn monthly_cases(df: &DataFrame, years: &YearSpan) -> Result<Vec<MonthlyCases>, AggregateError> {
        let diseases = df.column(DISEASE_COL)?.str()?;
        let months = df.column(MONTH_COL)?.u32()?;
        let yearly = Self::year_values(df, years)?;

        Ok((0..df.height())
            .filter_map(|i| {
                Some(MonthlyCases {
                    month: months.get(i)?,
                    disease: diseases.get(i)?.to_string(),
                    yearly: yearly.iter().map(|v| v[i]).collect(),
                })
            })
            .collect())
    }

    fn year_values(df: &DataFrame, years: &YearSpan) -> Result<Vec<Vec<i64>>, AggregateError> {
        years
            .columns()
            .iter()
            .map(|c| -> Result<Vec<i64>, AggregateError> {
                let values = df.column(c)?.i64()?;
                Ok(values.into_iter().map(|v| v.unwrap_or(0)).collect())
            })
            .collect()
    }

    /// Weekly (week, count) pairs of one disease in one year column.
    pub fn get_weekly_counts(
        df: &DataFrame,
        disease: &str,
        year: i32,
    ) -> Result<Vec<(i64, f64)>, AggregateError> {
        let year_col = YearSpan::column(year);
        let filtered = df
            .clone()
            .lazy()
            .filter(col(DISEASE_COL).eq(lit(disease)))
            .select([col(WEEK_COL), col(year_col.as_str())])
            .collect()?;

        let weeks = filtered.column(WEEK_COL)?.i64()?;
        let counts = filtered.column(&year_col)?.i64()?;
        Ok(weeks
            .into_iter()
            .zip(counts.into_iter())
            .filter_map(|(w, c)| Some((w?, c? as f64)))
            .collect())
    }

    /// Descriptive statistics for a set of (week, count) pairs.
    pub fn compute_weekly_stats(disease: &str, year: i32, weekly: &[(i64, f64)]) -> WeeklyStats {
        let counts: Vec<f64> = weekly.iter().map(|(_, c)| *c).collect();
        let peak_week = weekly
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(w, _)| *w);

        let weeks = counts.len();
        let data = Data::new(counts);
        let (min, max) = if weeks == 0 {
            (f64::NAN, f64::NAN)
        } else {
            (data.min(), data.max())
        };

        WeeklyStats {
            disease: disease.to_string(),
            year,
            weeks,
            mean: data.mean().unwrap_or(f64::NAN),
            std: data.std_dev().unwrap_or(0.0),
            min,
            max,
            peak_week,
        }
    }

    /// Weekly statistics for every (disease, year) pair, computed in parallel.
    pub fn compute_all_weekly_stats(
        df: &DataFrame,
        diseases: &[String],
        years: &YearSpan,
    ) -> Result<Vec<WeeklyStats>, AggregateError> {
        let pairs: Vec<(&String, i32)> = diseases
            .iter()
            .flat_map(|d| years.years().into_iter().map(move |y| (d, y)))
            .collect();

        pairs
            .par_iter()
            .map(|(disease, year)| {
                let weekly = Self::get_weekly_counts(df, disease, *year)?;
                Ok(Self::compute_weekly_stats(disease, *year, &weekly))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> YearSpan {
        YearSpan {
            first: 2016,
            last: 2017,
        }
    }

    fn clean_frame() -> DataFrame {
        df!(
            "disease" => ["Listeriosis", "Cyclosporiasis", "Listeriosis", "Typhoid fever", "Cyclosporiasis", "Listeriosis"],
            "mmwr_week" => [1i64, 1, 6, 6, 27, 0],
            "total_cases_2016" => [10i64, 2, 5, 1, 40, 7],
            "total_cases_2017" => [20i64, 3, 5, 1, 50, 0]
        )
        .unwrap()
    }

    #[test]
    fn month_of_week_follows_reference_calendar() {
        assert_eq!(month_of_week(1, 2013), Some(1));
        assert_eq!(month_of_week(5, 2013), Some(1)); // day 29
        assert_eq!(month_of_week(6, 2013), Some(2)); // day 36
        assert_eq!(month_of_week(27, 2013), Some(7)); // day 183
        assert_eq!(month_of_week(53, 2013), Some(12)); // day 365
        assert_eq!(month_of_week(0, 2013), None);
        assert_eq!(month_of_week(54, 2013), None);
    }

    #[test]
    fn sum_by_disease_adds_case_total() {
        let sums = StatsCalculator::sum_by_disease(&clean_frame(), &span()).unwrap();
        let totals = StatsCalculator::disease_totals(&sums, &span()).unwrap();

        let listeriosis = totals.iter().find(|t| t.disease == "Listeriosis").unwrap();
        assert_eq!(listeriosis.yearly, vec![22, 25]);
        assert_eq!(listeriosis.case_total, 47);
        assert_eq!(totals.len(), 3);
    }

    #[test]
    fn rank_top_n_orders_by_total_then_name() {
        let totals = df!(
            "disease" => ["b", "a", "c", "d"],
            "case_total" => [5i64, 5, 9, 1]
        )
        .unwrap();

        let top = StatsCalculator::rank_top_n(&totals, 3).unwrap();
        let names: Vec<&str> = top
            .column("disease")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        let all = StatsCalculator::rank_top_n(&totals, 10).unwrap();
        assert_eq!(all.height(), 4);

        assert!(matches!(
            StatsCalculator::rank_top_n(&totals, 0),
            Err(AggregateError::EmptyRanking)
        ));
    }

    #[test]
    fn with_month_drops_weeks_without_month() {
        let (df, skipped) = StatsCalculator::with_month(&clean_frame(), &span(), 2013).unwrap();

        assert_eq!(skipped, 1);
        assert_eq!(df.height(), 5);
        assert!(df.column("mmwr_week").is_err());
        let months: Vec<u32> = df.column("month").unwrap().u32().unwrap().into_iter().flatten().collect();
        assert_eq!(months, vec![1, 1, 2, 2, 7]);
    }

    #[test]
    fn monthly_aggregation_for_top_diseases() {
        let top = vec!["Listeriosis".to_string(), "Cyclosporiasis".to_string()];
        let (months, _) = StatsCalculator::with_month(&clean_frame(), &span(), 2013).unwrap();
        let filtered = StatsCalculator::filter_diseases(&months, &top).unwrap();
        let by_month = StatsCalculator::sum_by_month(&filtered, &span()).unwrap();
        let rows = StatsCalculator::monthly_cases(&by_month, &span()).unwrap();

        assert_eq!(
            rows,
            vec![
                MonthlyCases {
                    month: 1,
                    disease: "Cyclosporiasis".into(),
                    yearly: vec![2, 3]
                },
                MonthlyCases {
                    month: 1,
                    disease: "Listeriosis".into(),
                    yearly: vec![10, 20]
                },
                MonthlyCases {
                    month: 2,
                    disease: "Listeriosis".into(),
                    yearly: vec![5, 5]
                },
                MonthlyCases {
                    month: 7,
                    disease: "Cyclosporiasis".into(),
                    yearly: vec![40, 50]
                },
            ]
        );
    }

    #[test]
    fn filter_diseases_with_no_names_is_empty() {
        let df = StatsCalculator::filter_diseases(&clean_frame(), &[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 4);
    }

    #[test]
    fn weekly_stats_describe_counts() {
        let stats = StatsCalculator::compute_weekly_stats(
            "Listeriosis",
            2016,
            &[(1, 10.0), (6, 5.0), (0, 7.0)],
        );
        assert_eq!(stats.weeks, 3);
        assert!((stats.mean - 22.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.min, 5.0);
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.peak_week, Some(1));
        assert!(stats.std > 0.0);

        let empty = StatsCalculator::compute_weekly_stats("none", 2016, &[]);
        assert_eq!(empty.weeks, 0);
        assert!(empty.mean.is_nan());
        assert_eq!(empty.peak_week, None);
    }

    #[test]
    fn all_weekly_stats_cover_each_pair() {
        let diseases = vec!["Listeriosis".to_string(), "Typhoid fever".to_string()];
        let stats =
            StatsCalculator::compute_all_weekly_stats(&clean_frame(), &diseases, &span()).unwrap();

        assert_eq!(stats.len(), 4);
        let listeriosis_2017 = stats
            .iter()
            .find(|s| s.disease == "Listeriosis" && s.year == 2017)
            .unwrap();
        assert_eq!(listeriosis_2017.weeks, 3);
        assert_eq!(listeriosis_2017.max, 20.0);
    }

    #[test]
    fn weekly_stats_fail_on_missing_year_column() {
        let diseases = vec!["Listeriosis".to_string()];
        let years = YearSpan {
            first: 2012,
            last: 2013,
        };

        let err = StatsCalculator::compute_all_weekly_stats(&clean_frame(), &diseases, &years)
            .unwrap_err();
        assert!(matches!(err, AggregateError::PolarsError(_)));
        assert!(StatsCalculator::get_weekly_counts(&clean_frame(), "Listeriosis", 2012).is_err());
    }
}
