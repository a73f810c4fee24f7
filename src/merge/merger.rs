use crate::csv_table::{column_names, read_string_table, write_string_table};
use crate::merge::error::MergeError;
use crate::merge::merge_report::MergeReport;
use crate::types::flat_record::{CITY_COLUMN, DATE_COLUMN};
use crate::weather_data::day_file_store::DayFileStore;
use chrono::NaiveDate;
use log::{info, warn};
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Cell value for columns a per-day file does not have.
pub const NA_VALUE: &str = "NA";

/// A merged table before it is written, with the bookkeeping of how it was built.
#[derive(Debug, Clone)]
pub struct MergedTable {
    pub frame: DataFrame,
    pub rows_read: usize,
    pub exact_duplicates: usize,
    pub key_conflicts: usize,
    pub invalid_dates: Vec<String>,
}

/// Reads every per-day file in `store`, merges them and writes the result to
/// `output`. Blocking; call from a blocking task in async code.
pub fn merge_day_files(store: &DayFileStore, output: &Path) -> Result<MergeReport, MergeError> {
    let files = store.list()?;
    if files.is_empty() {
        return Err(MergeError::NoInputFiles(store.dir().to_path_buf()));
    }

    let mut frames = Vec::with_capacity(files.len());
    for file in &files {
        info!("Processing {}", file.display());
        frames.push(read_string_table(file)?);
    }

    let mut merged = merge_tables(frames)?;

    if let Some(dir) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| MergeError::OutputDirCreation(dir.to_path_buf(), e))?;
    }
    write_string_table(&mut merged.frame, output)?;
    info!("Aggregated file written to {}", output.display());

    Ok(MergeReport {
        files: files.len(),
        rows_read: merged.rows_read,
        rows_written: merged.frame.height(),
        columns: column_names(&merged.frame),
        exact_duplicates: merged.exact_duplicates,
        key_conflicts: merged.key_conflicts,
        invalid_dates: merged.invalid_dates,
        output: output.to_path_buf(),
    })
}

/// Concatenates string tables with possibly different columns.
///
/// The result has the union of all columns, sorted alphabetically, with
/// `"NA"` wherever a table lacks a column. Identical rows are dropped, then
/// rows repeating an earlier `(city_name, date)` key, in both cases keeping the
/// first occurrence in input order. Malformed dates are reported, not dropped.
pub fn merge_tables(frames: Vec<DataFrame>) -> Result<MergedTable, MergeError> {
    let columns: BTreeSet<String> = frames.iter().flat_map(column_names).collect();

    let missing: Vec<String> = [DATE_COLUMN, CITY_COLUMN]
        .into_iter()
        .filter(|c| !columns.contains(*c))
        .map(String::from)
        .collect();
    if !missing.is_empty() {
        return Err(MergeError::MissingRequiredColumns { missing });
    }

    info!("Total number of columns: {}", columns.len());
    info!(
        "Columns: {}",
        columns.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    );

    let selection: Vec<Expr> = columns.iter().map(|c| col(c.as_str())).collect();
    let aligned: Vec<LazyFrame> = frames
        .into_iter()
        .map(|df| {
            let present: HashSet<String> = column_names(&df).into_iter().collect();
            let fill: Vec<Expr> = columns
                .iter()
                .filter(|c| !present.contains(*c))
                .map(|c| lit(NA_VALUE).alias(c.as_str()))
                .collect();
            df.lazy().with_columns(fill).select(selection.clone())
        })
        .collect();

    let concatenated = concat(aligned, UnionArgs::default())?.collect()?;
    let rows_read = concatenated.height();

    let distinct = concatenated.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let exact_duplicates = rows_read - distinct.height();
    if exact_duplicates > 0 {
        warn!("Duplicates found. Number of duplicate rows removed: {}", exact_duplicates);
    } else {
        info!("No duplicate rows found.");
    }

    let key = [CITY_COLUMN.to_string(), DATE_COLUMN.to_string()];
    let keyed = distinct.unique_stable(Some(&key[..]), UniqueKeepStrategy::First, None)?;
    let key_conflicts = distinct.height() - keyed.height();
    if key_conflicts > 0 {
        warn!(
            "{} rows share a ({}, {}) with an earlier, different row and were dropped",
            key_conflicts, CITY_COLUMN, DATE_COLUMN
        );
    }

    let invalid_dates = invalid_dates(&keyed)?;
    if !invalid_dates.is_empty() {
        warn!(
            "Incorrect date format found in {} rows: {}. Manual checking is required.",
            invalid_dates.len(),
            invalid_dates.join(", ")
        );
    }

    Ok(MergedTable {
        frame: keyed,
        rows_read,
        exact_duplicates,
        key_conflicts,
        invalid_dates,
    })
}

/// Non-empty `date` values that are not a `YYYY-MM-DD` calendar date.
fn invalid_dates(df: &DataFrame) -> PolarsResult<Vec<String>> {
    Ok(df
        .column(DATE_COLUMN)?
        .str()?
        .into_iter()
        .flatten()
        .filter(|value| !value.is_empty() && !is_valid_date(value))
        .map(String::from)
        .collect())
}

/// True for zero-padded `YYYY-MM-DD` strings naming a real calendar day.
///
/// ```
/// use weather_archive::merge::merger::is_valid_date;
///
/// assert!(is_valid_date("2024-02-29"));
/// assert!(!is_valid_date("2023-02-29"));
/// assert!(!is_valid_date("2024-7-01"));
/// assert!(!is_valid_date("01/07/2024"));
/// ```
pub fn is_valid_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    shape_ok && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
