use chrono::NaiveDate;
use std::fmt;

/// A day that could not be fetched, kept so the run can go on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDay {
    pub city: String,
    pub date: NaiveDate,
    pub reason: String,
}

/// Outcome of one [`crate::WeatherArchive::collect`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Per-day files downloaded and written.
    pub written: usize,
    /// Per-day files that already existed.
    pub skipped: usize,
    pub failed: Vec<FailedDay>,
    /// Cities the geocoder could not resolve; none of their days were fetched.
    pub unresolved_cities: Vec<String>,
}

impl CollectReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.unresolved_cities.is_empty()
    }
}

impl fmt::Display for CollectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} already present, {} failed",
            self.written,
            self.skipped,
            self.failed.len()
        )?;
        if !self.unresolved_cities.is_empty() {
            write!(f, ", unresolved cities: {}", self.unresolved_cities.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_completeness() {
        let mut report = CollectReport {
            written: 3,
            skipped: 5,
            ..Default::default()
        };
        assert!(report.is_complete());
        assert_eq!(report.to_string(), "3 written, 5 already present, 0 failed");

        report.unresolved_cities.push("Atlantis".to_string());
        report.failed.push(FailedDay {
            city: "Beijing".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            reason: "HTTP 429".to_string(),
        });
        assert!(!report.is_complete());
        assert_eq!(
            report.to_string(),
            "3 written, 5 already present, 1 failed, unresolved cities: Atlantis"
        );
    }
}
