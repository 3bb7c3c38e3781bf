//! Fiscal period model.
//!
//! This module contains the [`FiscalPeriod`] type which maps dates to the
//! non-calendar fiscal years used for grants, expiry and compliance windows.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A fiscal year boundary defined by a fixed start month and day.
///
/// Fiscal year `N` starts on `start_month/start_day` of calendar year `N` and
/// ends the day before the following start.
///
/// # Example
///
/// ```
/// use leave_engine::models::FiscalPeriod;
/// use chrono::NaiveDate;
///
/// let period = FiscalPeriod::new(4, 1).unwrap();
///
/// assert_eq!(period.fiscal_year_of(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()), 2025);
/// assert_eq!(period.fiscal_year_of(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()), 2026);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriod {
    start_month: u32,
    start_day: u32,
}

impl FiscalPeriod {
    /// Creates a fiscal period starting on the given month and day.
    ///
    /// The day must be no later than the 28th so every year has a valid start.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a month outside 1..=12 or a day outside 1..=28.
    pub fn new(start_month: u32, start_day: u32) -> EngineResult<Self> {
        if !(1..=12).contains(&start_month) {
            return Err(EngineError::invalid_input(
                "start_month",
                format!("{} is not a month", start_month),
            ));
        }
        if !(1..=28).contains(&start_day) {
            return Err(EngineError::invalid_input(
                "start_day",
                format!("{} must be between 1 and 28", start_day),
            ));
        }
        Ok(Self {
            start_month,
            start_day,
        })
    }

    /// A fiscal year that coincides with the calendar year.
    pub fn calendar() -> Self {
        Self {
            start_month: 1,
            start_day: 1,
        }
    }

    /// Returns the start month.
    pub fn start_month(&self) -> u32 {
        self.start_month
    }

    /// Returns the start day of month.
    pub fn start_day(&self) -> u32 {
        self.start_day
    }

    /// Returns the first day of the given fiscal year.
    pub fn start_of(&self, fiscal_year: i32) -> EngineResult<NaiveDate> {
        NaiveDate::from_ymd_opt(fiscal_year, self.start_month, self.start_day).ok_or_else(|| {
            EngineError::invalid_input(
                "fiscal_year",
                format!("{} is outside the supported date range", fiscal_year),
            )
        })
    }

    /// Returns the last day of the given fiscal year.
    pub fn end_of(&self, fiscal_year: i32) -> EngineResult<NaiveDate> {
        let out_of_range = || {
            EngineError::invalid_input(
                "fiscal_year",
                format!("{} is outside the supported date range", fiscal_year),
            )
        };
        let next = fiscal_year.checked_add(1).ok_or_else(out_of_range)?;
        self.start_of(next)?.pred_opt().ok_or_else(out_of_range)
    }

    /// Returns the fiscal year the given date belongs to.
    pub fn fiscal_year_of(&self, date: NaiveDate) -> i32 {
        if (date.month(), date.day()) >= (self.start_month, self.start_day) {
            date.year()
        } else {
            date.year() - 1
        }
    }

    /// Checks if the date falls inside the given fiscal year.
    pub fn contains(&self, fiscal_year: i32, date: NaiveDate) -> bool {
        self.fiscal_year_of(date) == fiscal_year
    }
}

impl Default for FiscalPeriod {
    fn default() -> Self {
        Self::calendar()
    }
}
