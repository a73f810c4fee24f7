//! Run configuration, loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration apart from the API key, which must come from the
//! `OPENWEATHER_API_KEY` environment variable or the `api_key` field.

use crate::error::WeatherArchiveError;
use crate::types::date_span::DateSpan;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted before the `api_key` field.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

pub const DEFAULT_API_BASE_URL: &str = "https://api.openweathermap.org/data/3.0";
pub const DEFAULT_GEO_BASE_URL: &str = "https://api.openweathermap.org/geo/1.0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] serde_yaml::Error),

    #[error("No API key: set {API_KEY_ENV} or `api_key` in the config file")]
    MissingApiKey,

    #[error("No cities configured")]
    NoCities,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cities to collect, in request order.
    pub cities: Vec<String>,
    /// First day to collect (inclusive).
    pub start_date: NaiveDate,
    /// Last day to collect (inclusive).
    pub end_date: NaiveDate,
    /// Root of the data folder. Per-day files live in `daily/` below it and
    /// the merged CSV directly in it.
    pub data_dir: PathBuf,
    /// Where the geocoding cache is kept. Defaults to the system cache dir.
    pub cache_dir: Option<PathBuf>,
    /// Unit system passed to the API (`standard`, `metric` or `imperial`).
    pub units: String,
    /// Pause after each weather request; the API is rate limited.
    pub request_delay_ms: u64,
    /// Optional HTTP(S) proxy URL for all requests.
    pub proxy: Option<String>,
    pub api_base_url: String,
    pub geo_base_url: String,
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cities: ["Shenzhen", "Shanghai", "Guangzhou", "Beijing"]
                .into_iter()
                .map(String::from)
                .collect(),
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 29).unwrap_or_default(),
            data_dir: PathBuf::from("data"),
            cache_dir: None,
            units: "metric".to_string(),
            request_delay_ms: 1000,
            proxy: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            geo_base_url: DEFAULT_GEO_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

// Hand-written so the API key never ends up in a log line.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("cities", &self.cities)
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("data_dir", &self.data_dir)
            .field("cache_dir", &self.cache_dir)
            .field("units", &self.units)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("proxy", &self.proxy)
            .field("api_base_url", &self.api_base_url)
            .field("geo_base_url", &self.geo_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_yaml_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Resolves the API key, preferring the environment over the file.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.api_key_from(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_from(&self, env_value: Option<String>) -> Result<String, ConfigError> {
        env_value
            .into_iter()
            .chain(self.api_key.clone())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn date_span(&self) -> Result<DateSpan, WeatherArchiveError> {
        DateSpan::new(self.start_date, self.end_date)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Cities with surrounding whitespace and empty entries removed.
    pub fn city_names(&self) -> Result<Vec<String>, ConfigError> {
        let cities: Vec<String> = self
            .cities
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if cities.is_empty() {
            return Err(ConfigError::NoCities);
        }
        Ok(cities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cities.len(), 4);
        assert_eq!(config.units, "metric");
        assert_eq!(config.request_delay(), Duration::from_secs(1));
        assert_eq!(config.date_span().unwrap().len(), 29);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml_str("  \n").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml_str(
            "cities: [Paris, \" Lyon \", \"\"]\nstart_date: 2023-01-30\nend_date: 2023-02-02\nproxy: http://127.0.0.1:8080\n",
        )
        .unwrap();
        assert_eq!(config.city_names().unwrap(), vec!["Paris", "Lyon"]);
        assert_eq!(config.date_span().unwrap().len(), 4);
        assert_eq!(config.proxy.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(config.units, "metric");
    }

    #[test]
    fn test_unknown_date_format_is_error() {
        assert!(Config::from_yaml_str("start_date: 07/01/2024\n").is_err());
    }

    #[test]
    fn test_api_key_resolution_order() {
        let mut config = Config::default();
        assert!(matches!(
            config.api_key_from(None),
            Err(ConfigError::MissingApiKey)
        ));

        config.api_key = Some("from-file".to_string());
        assert_eq!(config.api_key_from(None).unwrap(), "from-file");
        assert_eq!(
            config.api_key_from(Some(" from-env ".to_string())).unwrap(),
            "from-env"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("secret-key".to_string()),
            ..Config::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_no_cities() {
        let config = Config {
            cities: vec!["  ".to_string()],
            ..Config::default()
        };
        assert!(matches!(config.city_names(), Err(ConfigError::NoCities)));
    }
}
