use crate::config::ConfigError;
use crate::csv_table::CsvTableError;
use crate::geocoding::error::GeocodeError;
use crate::merge::error::MergeError;
use crate::weather_data::error::WeatherDataError;
use chrono::NaiveDate;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherArchiveError {
    #[error(transparent)]
    WeatherData(#[from] WeatherDataError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    CsvTable(#[from] CsvTableError),

    #[error("Failed to create directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("End date {end} is before start date {start}")]
    InvalidDateSpan { start: NaiveDate, end: NaiveDate },

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),
}
