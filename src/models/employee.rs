//! Employee reference model.
//!
//! The engine does not own employee records; it only needs an identifier and
//! a hire date to derive seniority for the statutory grant table.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Represents an employee as supplied by the employee registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// The date the employee was hired.
    pub hire_date: NaiveDate,
}

impl Employee {
    /// Creates a new employee reference.
    pub fn new(id: impl Into<String>, hire_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            hire_date,
        }
    }

    /// Returns the number of whole months of service as of the given date.
    ///
    /// A month counts once the calendar has reached the hire date shifted by
    /// that many months (month-end hire dates clamp, so an August 31 hire has
    /// six months of service on the last day of February).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `as_of` is before the hire date.
    pub fn months_of_service(&self, as_of: NaiveDate) -> EngineResult<u32> {
        if as_of < self.hire_date {
            return Err(EngineError::invalid_input(
                "as_of",
                format!(
                    "{} is before hire date {} of employee '{}'",
                    as_of, self.hire_date, self.id
                ),
            ));
        }

        let calendar_months = (as_of.year() - self.hire_date.year()) * 12
            + as_of.month() as i32
            - self.hire_date.month() as i32;
        let mut months = calendar_months.max(0) as u32;

        while months > 0 && self.shifted_by(months).is_none_or(|date| date > as_of) {
            months -= 1;
        }

        Ok(months)
    }

    /// Returns seniority in fractional years as of the given date.
    ///
    /// Seniority is `whole months of service / 12`, so six months is exactly
    /// `0.5` and six years six months is exactly `6.5`.
    ///
    /// # Examples
    ///
    /// ```
    /// use leave_engine::models::Employee;
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee::new("emp_001", NaiveDate::from_ymd_opt(2019, 4, 1).unwrap());
    /// let seniority = employee
    ///     .seniority_years(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap())
    ///     .unwrap();
    /// assert_eq!(seniority, Decimal::new(65, 1));
    /// ```
    pub fn seniority_years(&self, as_of: NaiveDate) -> EngineResult<Decimal> {
        let months = self.months_of_service(as_of)?;
        Ok(Decimal::from(months) / Decimal::from(12))
    }

    fn shifted_by(&self, months: u32) -> Option<NaiveDate> {
        self.hire_date.checked_add_months(Months::new(months))
    }
}
