//! Calendar-month reporting periods.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::{EngineError, Result};

/// A calendar month, written "YYYY-MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportingPeriod {
    /// Always the first day of the month
    start: NaiveDate,
}

impl ReportingPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|start| Self { start })
            .ok_or_else(|| EngineError::InvalidPeriod(format!("{:04}-{:02}", year, month)))
    }

    /// The period a date falls in
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            start: date.with_day(1).unwrap_or(date),
        }
    }

    /// Parse "YYYY-MM" strictly: four-digit year, two-digit month.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidPeriod(s.to_string());
        let trimmed = s.trim();
        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4
            || month.len() != 2
            || !year.bytes().all(|c| c.is_ascii_digit())
            || !month.bytes().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start
    }

    /// The month `months` months earlier: 2024-02 minus 3 is 2023-11
    pub fn months_before(&self, months: u32) -> Self {
        Self {
            start: self
                .start
                .checked_sub_months(Months::new(months))
                .unwrap_or(self.start),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.start.year() && date.month() == self.start.month()
    }

    /// Undated events are never inside a period
    pub fn contains_opt(&self, date: Option<NaiveDate>) -> bool {
        date.is_some_and(|d| self.contains(d))
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for ReportingPeriod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ReportingPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
