//! Stats module - aggregation and weekly statistics

mod calculator;

pub use calculator::{
    month_of_week, AggregateError, DiseaseTotal, MonthlyCases, StatsCalculator, WeeklyStats,
    CASE_TOTAL_COL, MONTH_COL,
};
