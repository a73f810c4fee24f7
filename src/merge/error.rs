use crate::csv_table::CsvTableError;
use crate::weather_data::error::WeatherDataError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("No files matching 'weather_data_*.csv' found in '{0}'")]
    NoInputFiles(PathBuf),

    #[error("Columns {} are required in the merged data", .missing.join(", "))]
    MissingRequiredColumns { missing: Vec<String> },

    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    ListInputs(#[from] WeatherDataError),

    #[error(transparent)]
    CsvTable(#[from] CsvTableError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
