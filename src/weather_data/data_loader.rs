use crate::types::city::City;
use crate::types::flat_record::{FlatRecord, DATE_COLUMN};
use crate::weather_data::day_file_store::DayFileStore;
use crate::weather_data::error::WeatherDataError;
use chrono::NaiveDate;
use log::{info, warn};
use reqwest::{Client, Proxy};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by geocoding and weather requests, routed
/// through `proxy` when one is configured.
pub fn build_client(proxy: Option<&str>) -> Result<Client, WeatherDataError> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT);
    if let Some(url) = proxy {
        info!("Using proxy {}", url);
        builder = builder.proxy(Proxy::all(url).map_err(WeatherDataError::ClientBuild)?);
    }
    builder.build().map_err(WeatherDataError::ClientBuild)
}

/// What [`DaySummaryLoader::get_day`] did for one city and day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The per-day file already existed and no request was made.
    Cached(PathBuf),
    /// The day summary was downloaded and written to this file.
    Written(PathBuf),
}

/// Downloads day summaries from the One Call API and stores them as
/// per-day files, skipping days that are already on disk.
pub struct DaySummaryLoader {
    store: DayFileStore,
    client: Client,
    base_url: String,
    api_key: String,
    units: String,
}

impl DaySummaryLoader {
    pub fn new(
        store: DayFileStore,
        client: Client,
        base_url: &str,
        api_key: &str,
        units: &str,
    ) -> Self {
        Self {
            store,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            units: units.to_string(),
        }
    }

    pub fn store(&self) -> &DayFileStore {
        &self.store
    }

    /// Makes sure the file for `city` on `date` exists, downloading it on a
    /// cache miss. With `refresh` the file is downloaded again regardless.
    pub async fn get_day(
        &self,
        city: &City,
        date: NaiveDate,
        refresh: bool,
    ) -> Result<LoadOutcome, WeatherDataError> {
        if !refresh && self.store.exists(&city.name, date).await {
            let path = self.store.path_for(&city.name, date);
            info!("Cache hit for {} on {} at {:?}", city.name, date, path);
            return Ok(LoadOutcome::Cached(path));
        }

        if refresh {
            info!("Refreshing {} on {}", city.name, date);
        } else {
            info!("Cache miss for {} on {}. Downloading.", city.name, date);
        }
        let record = self.download(city, date).await?;
        let path = self.store.write(&city.name, date, record).await?;
        info!("Data for {} on {} written to {:?}", city.name, date, path);
        Ok(LoadOutcome::Written(path))
    }

    /// Requests the day summary for `city` on `date` and flattens it.
    pub async fn download(
        &self,
        city: &City,
        date: NaiveDate,
    ) -> Result<FlatRecord, WeatherDataError> {
        let url = format!("{}/onecall/day_summary", self.base_url);
        let date_str = date.format("%Y-%m-%d").to_string();
        let lat = city.coordinates.lat.to_string();
        let lon = city.coordinates.lon.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("date", date_str.as_str()),
                ("units", self.units.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| WeatherDataError::NetworkRequest(url.clone(), e.without_url()))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {} on {}: {:?}", city.name, date, e.status());
                return Err(match e.status() {
                    Some(status) => WeatherDataError::HttpStatus {
                        url,
                        status,
                        source: e.without_url(),
                    },
                    None => WeatherDataError::NetworkRequest(url, e.without_url()),
                });
            }
        };

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| WeatherDataError::JsonDecode(url, e.without_url()))?;

        summary_to_record(&body, city, date)
    }
}

/// Flattens a day summary body and tags it with the requested city. A body
/// without a `date` gets the requested date so the record stays keyed.
pub(crate) fn summary_to_record(
    body: &Value,
    city: &City,
    date: NaiveDate,
) -> Result<FlatRecord, WeatherDataError> {
    let mut record =
        FlatRecord::from_json(body).ok_or_else(|| WeatherDataError::EmptyResponse {
            city: city.name.clone(),
            date,
        })?;
    if record.date().map_or(true, str::is_empty) {
        record.insert(DATE_COLUMN, date.format("%Y-%m-%d").to_string());
    }
    Ok(record.with_city(&city.name))
}
