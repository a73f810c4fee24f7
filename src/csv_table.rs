//! Reading and writing the CSV files this crate produces.
//!
//! Every table is handled with all columns typed as strings: the per-day files
//! carry whatever the API answered, and the merge must not reinterpret values.
//! Files are written UTF-8 with a byte order mark so the spreadsheet opens
//! them with the right encoding, and the mark is stripped again on read.

use crate::types::flat_record::FlatRecord;
use polars::prelude::*;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Error)]
pub enum CsvTableError {
    #[error("Failed to read CSV file '{0}'")]
    ReadIo(PathBuf, #[source] io::Error),

    #[error("Failed to parse CSV file '{0}'")]
    Parse(PathBuf, #[source] PolarsError),

    #[error("I/O error writing CSV file '{0}'")]
    WriteIo(PathBuf, #[source] io::Error),

    #[error("Encoding error writing CSV file '{0}'")]
    WritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to build a table from record")]
    RecordConversion(#[source] PolarsError),
}

/// Reads a CSV file with a header row into a DataFrame of string columns.
pub fn read_string_table(path: &Path) -> Result<DataFrame, CsvTableError> {
    let bytes = std::fs::read(path).map_err(|e| CsvTableError::ReadIo(path.to_path_buf(), e))?;
    parse_string_table(bytes).map_err(|e| CsvTableError::Parse(path.to_path_buf(), e))
}

/// Parses CSV bytes (header row required, optional BOM) into string columns.
pub fn parse_string_table(mut bytes: Vec<u8>) -> PolarsResult<DataFrame> {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    // An inference length of zero reads every column as String.
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

/// Writes `df` to `path` atomically: the table goes to a temporary file in
/// the target directory first and is then renamed over `path`.
pub fn write_string_table(df: &mut DataFrame, path: &Path) -> Result<(), CsvTableError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp_file =
        NamedTempFile::new_in(dir).map_err(|e| CsvTableError::WriteIo(path.to_path_buf(), e))?;

    CsvWriter::new(temp_file.as_file_mut())
        .include_header(true)
        .include_bom(true)
        .finish(df)
        .map_err(|e| CsvTableError::WritePolars(path.to_path_buf(), e))?;

    temp_file
        .persist(path)
        .map_err(|e| CsvTableError::WriteIo(path.to_path_buf(), e.error))?;
    Ok(())
}

/// Converts a flattened observation into a single-row DataFrame, keeping
/// the record's column order.
pub fn record_to_frame(record: &FlatRecord) -> Result<DataFrame, CsvTableError> {
    let columns = record
        .fields()
        .iter()
        .map(|(name, value)| Column::new(name.as_str().into(), [value.as_str()]))
        .collect::<Vec<_>>();
    DataFrame::new(columns).map_err(CsvTableError::RecordConversion)
}

/// Column names of `df` as owned strings, in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_bom_and_keeps_strings() -> PolarsResult<()> {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"date,city_name,humidity_afternoon\n2024-07-01,Beijing,070\n");
        let df = parse_string_table(bytes)?;

        assert_eq!(column_names(&df), vec!["date", "city_name", "humidity_afternoon"]);
        assert_eq!(df.column("humidity_afternoon")?.dtype(), &DataType::String);
        // Leading zeros survive because nothing is parsed as a number.
        assert_eq!(df.column("humidity_afternoon")?.str()?.get(0), Some("070"));
        Ok(())
    }

    #[test]
    fn test_write_then_read_record() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("weather_data_beijing_2024-07-01.csv");

        let mut record = FlatRecord::new();
        record.insert("date", "2024-07-01");
        record.insert("summary", "hot, humid \"day\"");
        let record = record.with_city("Beijing");

        let mut df = record_to_frame(&record)?;
        write_string_table(&mut df, &path)?;

        let raw = std::fs::read(&path)?;
        assert!(raw.starts_with(UTF8_BOM));

        let back = read_string_table(&path)?;
        assert_eq!(back.height(), 1);
        assert_eq!(column_names(&back), vec!["date", "summary", "city_name"]);
        assert_eq!(back.column("summary")?.str()?.get(0), Some("hot, humid \"day\""));
        assert_eq!(back.column("city_name")?.str()?.get(0), Some("Beijing"));
        Ok(())
    }

    #[test]
    fn test_write_replaces_existing_file() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("out.csv");
        std::fs::write(&path, "stale\n")?;

        let mut record = FlatRecord::new();
        record.insert("date", "2024-07-02");
        let mut df = record_to_frame(&record)?;
        write_string_table(&mut df, &path)?;

        let back = read_string_table(&path)?;
        assert_eq!(column_names(&back), vec!["date"]);
        Ok(())
    }

    #[test]
    fn test_read_missing_file_is_read_error() {
        let err = read_string_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, CsvTableError::ReadIo(..)));
    }
}
