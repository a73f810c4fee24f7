//! This module provides the main entry point of the crate. A [`WeatherArchive`]
//! runs the three stages over one data folder: collecting per-day files from
//! the weather API, merging them into the aggregated CSV, and loading that CSV
//! for the dashboard figures.

use crate::config::Config;
use crate::error::WeatherArchiveError;
use crate::geocoding::locate_city::CityLocator;
use crate::merge::merge_report::MergeReport;
use crate::merge::merger::merge_day_files;
use crate::types::date_span::DateSpan;
use crate::types::weather_table::WeatherTable;
use crate::utils::{ensure_dir_exists, get_cache_dir};
use crate::weather_data::collect_report::{CollectReport, FailedDay};
use crate::weather_data::data_loader::{build_client, DaySummaryLoader, LoadOutcome};
use crate::weather_data::day_file_store::DayFileStore;
use crate::weather_data::error::WeatherDataError;
use bon::bon;
use chrono::NaiveDate;
use log::{error, info, warn};
use std::path::PathBuf;

/// Folder below the data dir holding the per-day files.
pub const DAILY_DIR_NAME: &str = "daily";
/// File name of the merged table the spreadsheet reads.
pub const AGGREGATED_FILE_NAME: &str = "weather_data_aggregated.csv";

/// The client for collecting, merging and reading the weather archive.
///
/// Construction does no I/O. The API key is only needed by
/// [`WeatherArchive::collect`], so merging and summarizing work without one.
///
/// # Examples
///
/// ```no_run
/// # use weather_archive::{Config, WeatherArchive, WeatherArchiveError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), WeatherArchiveError> {
/// let archive = WeatherArchive::new(Config::default());
///
/// let collected = archive.collect().refresh(false).call().await?;
/// println!("{collected}");
///
/// let merged = archive.merge().call().await?;
/// println!("{merged}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WeatherArchive {
    config: Config,
    store: DayFileStore,
}

#[bon]
impl WeatherArchive {
    pub fn new(config: Config) -> Self {
        let store = DayFileStore::new(&config.data_dir.join(DAILY_DIR_NAME));
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The per-day file folder.
    pub fn store(&self) -> &DayFileStore {
        &self.store
    }

    /// Where the merged CSV goes unless told otherwise.
    pub fn default_output(&self) -> PathBuf {
        self.config.data_dir.join(AGGREGATED_FILE_NAME)
    }

    fn cache_dir(&self) -> Result<PathBuf, WeatherArchiveError> {
        match &self.config.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_cache_dir().map_err(WeatherArchiveError::CacheDirResolution),
        }
    }

    /// Downloads the day summary of every city for every day in the span and
    /// stores each as a per-day file.
    ///
    /// Cities and dates default to the configuration. Days that already have
    /// a file are skipped unless `refresh` is set. A day that fails is logged
    /// and recorded in the report, and the run continues; a city the geocoder
    /// cannot resolve is skipped entirely.
    ///
    /// # Errors
    ///
    /// Fails before any request with [`WeatherArchiveError::InvalidDateSpan`]
    /// if `end` is before `start`, with [`WeatherArchiveError::Config`] if no
    /// API key or no city is configured, and with the client or cache errors
    /// that make the whole run impossible.
    #[builder]
    pub async fn collect(
        &self,
        cities: Option<Vec<String>>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        refresh: Option<bool>,
    ) -> Result<CollectReport, WeatherArchiveError> {
        let span = match (start, end) {
            (None, None) => self.config.date_span()?,
            (start, end) => DateSpan::new(
                start.unwrap_or(self.config.start_date),
                end.unwrap_or(self.config.end_date),
            )?,
        };
        let cities = match cities {
            Some(cities) if !cities.is_empty() => cities,
            _ => self.config.city_names()?,
        };
        let refresh = refresh.unwrap_or(false);
        let api_key = self.config.resolve_api_key()?;

        let cache_dir = self.cache_dir()?;
        ensure_dir_exists(&cache_dir)
            .await
            .map_err(|e| WeatherArchiveError::DirCreation(cache_dir.clone(), e))?;

        let client = build_client(self.config.proxy.as_deref())?;
        let mut locator =
            CityLocator::new(&cache_dir, client.clone(), &self.config.geo_base_url, &api_key)
                .await?;

        let mut report = CollectReport::default();
        let mut resolved = Vec::with_capacity(cities.len());
        for name in &cities {
            match locator.locate(name).await {
                Ok(city) => resolved.push(city),
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    report.unresolved_cities.push(name.clone());
                }
            }
        }

        let loader = DaySummaryLoader::new(
            self.store.clone(),
            client,
            &self.config.api_base_url,
            &api_key,
            &self.config.units,
        );
        let delay = self.config.request_delay();
        info!(
            "Collecting {} days for {} cities ({})",
            span.len(),
            resolved.len(),
            span
        );

        for date in span.days() {
            for city in &resolved {
                let requested = match loader.get_day(city, date, refresh).await {
                    Ok(LoadOutcome::Cached(_)) => {
                        report.skipped += 1;
                        false
                    }
                    Ok(LoadOutcome::Written(_)) => {
                        report.written += 1;
                        true
                    }
                    Err(e) => {
                        error!("Failed to collect {} on {}: {}", city.name, date, e);
                        report.failed.push(FailedDay {
                            city: city.name.clone(),
                            date,
                            reason: e.to_string(),
                        });
                        true
                    }
                };
                if requested && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        info!("Data collection complete: {}", report);
        Ok(report)
    }

    /// Merges every per-day file into one CSV, by default
    /// `{data_dir}/weather_data_aggregated.csv`.
    ///
    /// The target is replaced atomically. Use [`WeatherArchive::default_output`]
    /// to check for an existing file before calling this.
    #[builder]
    pub async fn merge(&self, output: Option<PathBuf>) -> Result<MergeReport, WeatherArchiveError> {
        let output = output.unwrap_or_else(|| self.default_output());
        let store = self.store.clone();
        let report = tokio::task::spawn_blocking(move || merge_day_files(&store, &output))
            .await
            .map_err(WeatherDataError::from)??;
        info!("Merge complete: {}", report);
        Ok(report)
    }

    /// Loads the merged CSV, by default the one [`WeatherArchive::merge`] writes.
    #[builder]
    pub fn table(&self, input: Option<PathBuf>) -> Result<WeatherTable, WeatherArchiveError> {
        let input = input.unwrap_or_else(|| self.default_output());
        WeatherTable::load(&input)
    }
}
