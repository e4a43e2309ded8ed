//! Year-month reporting periods.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of months in a projection row.
pub const MONTHS: usize = 12;

/// A calendar year-month used as the balance aggregation window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// First day of the period.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// True when the date falls strictly before this period.
    pub fn is_after(&self, date: NaiveDate) -> bool {
        date < self.first_day()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Errors that can occur when constructing [`Period`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodError {
    InvalidMonth(u32),
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::InvalidMonth(month) => {
                write!(f, "month must be 1..=12, got {month}")
            }
        }
    }
}

impl std::error::Error for PeriodError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_month() {
        assert!(Period::new(2025, 0).is_err());
        assert!(Period::new(2025, 13).is_err());
        assert!(Period::new(2025, 12).is_ok());
    }

    #[test]
    fn contains_only_dates_inside_the_month() {
        let period = Period::new(2025, 3).unwrap();
        assert!(period.contains(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()));
        assert!(period.is_after(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()));
    }
}
