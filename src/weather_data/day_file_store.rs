use crate::csv_table::{record_to_frame, write_string_table};
use crate::types::city::City;
use crate::types::flat_record::FlatRecord;
use crate::utils::ensure_dir_exists;
use crate::weather_data::error::WeatherDataError;
use chrono::NaiveDate;
use std::io;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

/// Prefix shared by every per-day file.
pub const DAY_FILE_PREFIX: &str = "weather_data_";
const DAY_FILE_EXTENSION: &str = "csv";

/// The folder of per-city/per-day files, one CSV (header plus one row) each.
///
/// Files are named `weather_data_{city_slug}_{YYYY-MM-DD}.csv`, so a plain
/// name sort groups them by city and orders each city by date.
#[derive(Debug, Clone)]
pub struct DayFileStore {
    dir: PathBuf,
}

impl DayFileStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, city: &str, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}{}_{}.{}",
            DAY_FILE_PREFIX,
            City::slug_of(city),
            date.format("%Y-%m-%d"),
            DAY_FILE_EXTENSION
        ))
    }

    pub async fn exists(&self, city: &str, date: NaiveDate) -> bool {
        fs::metadata(self.path_for(city, date)).await.is_ok()
    }

    /// Writes `record` as the file for `city` on `date`, replacing any
    /// previous file atomically.
    pub async fn write(
        &self,
        city: &str,
        date: NaiveDate,
        record: FlatRecord,
    ) -> Result<PathBuf, WeatherDataError> {
        ensure_dir_exists(&self.dir)
            .await
            .map_err(|e| WeatherDataError::DataDirCreation(self.dir.clone(), e))?;

        let path = self.path_for(city, date);
        let path_clone = path.clone();
        task::spawn_blocking(move || {
            let mut df = record_to_frame(&record)?;
            write_string_table(&mut df, &path_clone)?;
            Ok::<(), WeatherDataError>(())
        })
        .await??;
        Ok(path)
    }

    /// All per-day files in the folder, sorted by file name. A missing
    /// folder simply holds no files.
    pub fn list(&self) -> Result<Vec<PathBuf>, WeatherDataError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(WeatherDataError::DataDirList(self.dir.clone(), e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| WeatherDataError::DataDirList(self.dir.clone(), e))?
                .path();
            if path.is_file() && is_day_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn is_day_file(path: &Path) -> bool {
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(DAY_FILE_PREFIX));
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DAY_FILE_EXTENSION));
    has_prefix && has_extension
}
