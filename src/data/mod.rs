//! Data module - CSV loading and cleaning

mod loader;
mod processor;

pub use loader::{normalize_columns, normalize_header, DataLoader, LoaderError};
pub use processor::{CleaningReport, DataProcessor, ProcessorError, DISEASE_COL, WEEK_COL};
