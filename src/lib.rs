//! NNDSS Report - CDC notifiable disease cleaning, aggregation & charts
//!
//! Cleans the NNDSS "Table I. infrequently reported notifiable diseases"
//! export, ranks the most reported diseases and charts them by year and month.

pub mod charts;
pub mod config;
pub mod data;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use config::{Settings, YearSpan};
pub use pipeline::{run, PipelineOutcome};
