//! Inclusive calendar date ranges used to drive the per-day fetch loop.

use crate::error::WeatherArchiveError;
use chrono::NaiveDate;
use std::fmt;

/// An inclusive range of calendar days.
///
/// Construction validates that `end` is not before `start`; a span with
/// `start == end` covers exactly one day.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use weather_archive::DateSpan;
///
/// let span = DateSpan::new(
///     NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 7, 3).unwrap(),
/// )
/// .unwrap();
/// assert_eq!(span.days().count(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateSpan {
    /// Creates a span, failing with [`WeatherArchiveError::InvalidDateSpan`]
    /// when `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WeatherArchiveError> {
        if end < start {
            return Err(WeatherArchiveError::InvalidDateSpan { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the span, both ends included.
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Always false: a valid span holds at least one day.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates every day from `start` to `end`, inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_span_rejects_end_before_start() {
        let result = DateSpan::new(date(2024, 7, 29), date(2024, 7, 1));
        assert!(matches!(
            result,
            Err(WeatherArchiveError::InvalidDateSpan { .. })
        ));
    }

    #[test]
    fn test_single_day_span() {
        let span = DateSpan::new(date(2024, 7, 1), date(2024, 7, 1)).unwrap();
        let days: Vec<_> = span.days().collect();
        assert_eq!(days, vec![date(2024, 7, 1)]);
        assert_eq!(span.len(), 1);
    }

    #[test]
    fn test_span_crosses_month_and_leap_day() {
        let span = DateSpan::new(date(2024, 2, 27), date(2024, 3, 2)).unwrap();
        let days: Vec<_> = span.days().collect();
        assert_eq!(days.len(), 5);
        assert_eq!(days[2], date(2024, 2, 29));
        assert_eq!(*days.last().unwrap(), date(2024, 3, 2));
        assert_eq!(span.len(), 5);
    }

    #[test]
    fn test_display() {
        let span = DateSpan::new(date(2024, 7, 1), date(2024, 7, 29)).unwrap();
        assert_eq!(span.to_string(), "2024-07-01..=2024-07-29");
    }
}
