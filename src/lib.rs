mod config;
mod csv_table;
mod error;
mod geocoding;
pub mod merge;
mod types;
mod utils;
mod weather_archive;
mod weather_data;

pub use config::{Config, ConfigError, API_KEY_ENV, DEFAULT_API_BASE_URL, DEFAULT_GEO_BASE_URL};
pub use csv_table::{read_string_table, write_string_table, CsvTableError};
pub use error::WeatherArchiveError;
pub use weather_archive::*;

pub use types::city::{City, Coordinates};
pub use types::date_span::DateSpan;
pub use types::flat_record::{FlatRecord, CITY_COLUMN, DATE_COLUMN};
pub use types::weather_table::{CitySummary, WeatherTable};

pub use geocoding::error::GeocodeError;
pub use geocoding::locate_city::CityLocator;

pub use merge::error::MergeError;
pub use merge::merge_report::MergeReport;
pub use merge::merger::{merge_tables, MergedTable, NA_VALUE};

pub use weather_data::collect_report::{CollectReport, FailedDay};
pub use weather_data::data_loader::{build_client, DaySummaryLoader, LoadOutcome};
pub use weather_data::day_file_store::DayFileStore;
pub use weather_data::error::WeatherDataError;
