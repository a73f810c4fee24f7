use std::fmt;
use std::path::PathBuf;

/// What a merge run read, dropped and wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Number of per-day files read.
    pub files: usize,
    pub rows_read: usize,
    pub rows_written: usize,
    /// Columns of the merged table, sorted alphabetically.
    pub columns: Vec<String>,
    /// Rows dropped because an identical row came earlier.
    pub exact_duplicates: usize,
    /// Rows dropped because an earlier, different row had the same
    /// `(city_name, date)` key.
    pub key_conflicts: usize,
    /// Date values that are not `YYYY-MM-DD` calendar dates. These rows are kept.
    pub invalid_dates: Vec<String>,
    pub output: PathBuf,
}

impl MergeReport {
    pub fn has_warnings(&self) -> bool {
        self.exact_duplicates > 0 || self.key_conflicts > 0 || !self.invalid_dates.is_empty()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} rows read, {} rows written to {} ({} columns); {} duplicate rows, {} key conflicts, {} invalid dates",
            self.files,
            self.rows_read,
            self.rows_written,
            self.output.display(),
            self.columns.len(),
            self.exact_duplicates,
            self.key_conflicts,
            self.invalid_dates.len()
        )
    }
}
