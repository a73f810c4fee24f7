//! Contains the `WeatherTable` structure, a lazy view of the aggregated CSV
//! that computes the per-city figures the dashboard displays.

use crate::csv_table::{column_names, read_string_table};
use crate::error::WeatherArchiveError;
use crate::types::flat_record::{CITY_COLUMN, DATE_COLUMN};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;

const TEMPERATURE_MIN: &str = "temperature_min";
const TEMPERATURE_MAX: &str = "temperature_max";
const TEMPERATURE_AFTERNOON: &str = "temperature_afternoon";
const HUMIDITY_AFTERNOON: &str = "humidity_afternoon";
const PRECIPITATION_TOTAL: &str = "precipitation_total";

/// One row of [`WeatherTable::city_summary`].
#[derive(Debug, Clone, PartialEq)]
pub struct CitySummary {
    pub city: String,
    pub days: u32,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub mean_afternoon_temp: Option<f64>,
    pub mean_afternoon_humidity: Option<f64>,
    pub total_precipitation: Option<f64>,
}

/// A wrapper around a Polars `LazyFrame` holding the aggregated weather table.
///
/// All columns are strings, exactly as merged. Date filters compare the ISO
/// `YYYY-MM-DD` strings, which sort the same way as the dates they name.
#[derive(Clone)]
pub struct WeatherTable {
    /// The underlying Polars LazyFrame.
    pub frame: LazyFrame,
}

impl WeatherTable {
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    /// Loads an aggregated CSV written by the merge step.
    pub fn load(path: &Path) -> Result<Self, WeatherArchiveError> {
        let df = read_string_table(path)?;
        Ok(Self::new(df.lazy()))
    }

    /// Applies an arbitrary Polars predicate lazily.
    pub fn filter(&self, predicate: Expr) -> WeatherTable {
        WeatherTable::new(self.frame.clone().filter(predicate))
    }

    pub fn for_city(&self, city: &str) -> WeatherTable {
        self.filter(col(CITY_COLUMN).eq(lit(city)))
    }

    /// Rows dated from `start` to `end`, both inclusive.
    pub fn get_range(&self, start: NaiveDate, end: NaiveDate) -> WeatherTable {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        self.filter(
            col(DATE_COLUMN)
                .gt_eq(lit(start))
                .and(col(DATE_COLUMN).lt_eq(lit(end))),
        )
    }

    pub fn get_at(&self, date: NaiveDate) -> WeatherTable {
        self.filter(col(DATE_COLUMN).eq(lit(date.format("%Y-%m-%d").to_string())))
    }

    /// Aggregates the table per city, sorted by city name.
    ///
    /// Values that are `"NA"`, empty or not numeric are ignored. A metric
    /// column missing from the table yields `None` for every city.
    pub fn city_summary(&self) -> Result<Vec<CitySummary>, WeatherArchiveError> {
        let df = self.city_summary_frame()?;

        let cities = df.column(CITY_COLUMN)?.str()?;
        let days = df.column("days")?.u32()?;
        let temp_min = df.column("temp_min")?.f64()?;
        let temp_max = df.column("temp_max")?.f64()?;
        let afternoon = df.column("mean_afternoon_temp")?.f64()?;
        let humidity = df.column("mean_afternoon_humidity")?.f64()?;
        let precipitation = df.column("total_precipitation")?.f64()?;

        Ok((0..df.height())
            .map(|i| CitySummary {
                city: cities.get(i).unwrap_or_default().to_string(),
                days: days.get(i).unwrap_or_default(),
                temp_min: temp_min.get(i),
                temp_max: temp_max.get(i),
                mean_afternoon_temp: afternoon.get(i),
                mean_afternoon_humidity: humidity.get(i),
                total_precipitation: precipitation.get(i),
            })
            .collect())
    }

    /// [`Self::city_summary`] as a DataFrame, handy for printing.
    pub fn city_summary_frame(&self) -> Result<DataFrame, WeatherArchiveError> {
        let mut df = self.frame.clone().collect()?;
        let present = column_names(&df);
        for metric in [
            TEMPERATURE_MIN,
            TEMPERATURE_MAX,
            TEMPERATURE_AFTERNOON,
            HUMIDITY_AFTERNOON,
            PRECIPITATION_TOTAL,
        ] {
            if !present.iter().any(|p| p == metric) {
                df.with_column(Column::full_null(
                    metric.into(),
                    df.height(),
                    &DataType::String,
                ))?;
            }
        }

        let summary = df
            .lazy()
            .group_by([col(CITY_COLUMN)])
            .agg([
                len().cast(DataType::UInt32).alias("days"),
                numeric(TEMPERATURE_MIN).min().alias("temp_min"),
                numeric(TEMPERATURE_MAX).max().alias("temp_max"),
                numeric(TEMPERATURE_AFTERNOON)
                    .mean()
                    .alias("mean_afternoon_temp"),
                numeric(HUMIDITY_AFTERNOON)
                    .mean()
                    .alias("mean_afternoon_humidity"),
                numeric(PRECIPITATION_TOTAL)
                    .sum()
                    .alias("total_precipitation"),
            ])
            .sort([CITY_COLUMN], SortMultipleOptions::default())
            .collect()?;
        Ok(summary)
    }
}

/// Casts a string column to f64; anything unparsable, `"NA"` included, becomes null.
fn numeric(column: &str) -> Expr {
    col(column).cast(DataType::Float64)
}
