//! Leave lot model.
//!
//! A [`LeaveLot`] is one discrete batch of granted paid-leave days with its
//! own grant date, expiry date and remaining balance. An employee's balance
//! is the sum of the remaining days across their usable lots.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Lifecycle status of a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    /// The lot can still be consumed (it may be exhausted).
    Active,
    /// The lot passed its retention window; its remainder was forfeited.
    Expired,
}

/// One granted batch of leave days.
///
/// Fields are read-only to callers. Remaining days are only changed by the
/// deduction and carry-over operations, which keep the ledger invariants.
///
/// # Example
///
/// ```
/// use leave_engine::models::LeaveLot;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let grant_date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
/// let expiry = LeaveLot::expiry_for(grant_date, 2).unwrap();
/// let lot = LeaveLot::new("emp_001", Decimal::from(10), grant_date, expiry, 2025).unwrap();
///
/// assert_eq!(lot.expiry_date(), NaiveDate::from_ymd_opt(2027, 3, 31).unwrap());
/// assert_eq!(lot.amount_remaining(), Decimal::from(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveLot {
    id: Uuid,
    employee_id: String,
    amount_granted: Decimal,
    amount_remaining: Decimal,
    grant_date: NaiveDate,
    expiry_date: NaiveDate,
    fiscal_year: i32,
    status: LotStatus,
}

/// Returns true if the amount is a whole or half day.
pub(crate) fn is_half_day_multiple(amount: Decimal) -> bool {
    let fraction = amount.fract().abs();
    fraction.is_zero() || fraction == Decimal::new(5, 1)
}

impl LeaveLot {
    /// Creates a new, fully unused lot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the employee id is empty, the amount is
    /// negative or not in half-day units, or the expiry date is not after the
    /// grant date.
    pub fn new(
        employee_id: impl Into<String>,
        amount_granted: Decimal,
        grant_date: NaiveDate,
        expiry_date: NaiveDate,
        fiscal_year: i32,
    ) -> EngineResult<Self> {
        let lot = Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.into(),
            amount_granted,
            amount_remaining: amount_granted,
            grant_date,
            expiry_date,
            fiscal_year,
            status: LotStatus::Active,
        };
        lot.validate()?;
        Ok(lot)
    }

    /// Returns the last usable day of a lot granted on `grant_date` under a
    /// retention window of `retention_years`.
    ///
    /// A lot granted on 2025-04-01 with a two-year window is usable through
    /// 2027-03-31.
    pub fn expiry_for(grant_date: NaiveDate, retention_years: u32) -> EngineResult<NaiveDate> {
        if retention_years == 0 {
            return Err(EngineError::invalid_input(
                "retention_years",
                "must be at least one year",
            ));
        }
        retention_years
            .checked_mul(12)
            .and_then(|months| grant_date.checked_add_months(Months::new(months)))
            .and_then(|date| date.pred_opt())
            .ok_or_else(|| {
                EngineError::invalid_input(
                    "grant_date",
                    format!("{} plus {} years is out of range", grant_date, retention_years),
                )
            })
    }

    /// Checks the record-level invariants of this lot.
    pub fn validate(&self) -> EngineResult<()> {
        if self.employee_id.trim().is_empty() {
            return Err(EngineError::invalid_input("employee_id", "must not be empty"));
        }
        if self.amount_granted < Decimal::ZERO {
            return Err(EngineError::invalid_input(
                "amount_granted",
                format!("{} is negative", self.amount_granted),
            ));
        }
        if !is_half_day_multiple(self.amount_granted) {
            return Err(EngineError::invalid_input(
                "amount_granted",
                format!("{} is not in half-day units", self.amount_granted),
            ));
        }
        if self.expiry_date <= self.grant_date {
            return Err(EngineError::invalid_input(
                "expiry_date",
                format!(
                    "{} is not after grant date {}",
                    self.expiry_date, self.grant_date
                ),
            ));
        }
        if self.amount_remaining < Decimal::ZERO || self.amount_remaining > self.amount_granted {
            return Err(EngineError::InvariantViolation {
                message: format!(
                    "lot {} has remaining {} outside 0..={}",
                    self.id, self.amount_remaining, self.amount_granted
                ),
            });
        }
        if self.status == LotStatus::Expired && !self.amount_remaining.is_zero() {
            return Err(EngineError::InvariantViolation {
                message: format!(
                    "expired lot {} still holds {} days",
                    self.id, self.amount_remaining
                ),
            });
        }
        Ok(())
    }

    /// Returns the lot id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the owning employee id.
    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    /// Returns the number of days granted.
    pub fn amount_granted(&self) -> Decimal {
        self.amount_granted
    }

    /// Returns the number of days still available in this lot.
    pub fn amount_remaining(&self) -> Decimal {
        self.amount_remaining
    }

    /// Returns the grant date.
    pub fn grant_date(&self) -> NaiveDate {
        self.grant_date
    }

    /// Returns the last day this lot can be used.
    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }

    /// Returns the fiscal year the grant belongs to.
    pub fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> LotStatus {
        self.status
    }

    /// Returns true once the lot has been marked expired.
    pub fn is_marked_expired(&self) -> bool {
        self.status == LotStatus::Expired
    }

    /// Returns true if the lot is expired as of the given date.
    pub fn is_expired_as_of(&self, date: NaiveDate) -> bool {
        self.is_marked_expired() || date > self.expiry_date
    }

    /// Returns true if all granted days have been used or forfeited.
    pub fn is_exhausted(&self) -> bool {
        self.amount_remaining.is_zero()
    }

    /// Returns true if days can be taken from this lot on the given date.
    pub fn is_usable_on(&self, date: NaiveDate) -> bool {
        self.grant_date <= date && !self.is_expired_as_of(date) && !self.is_exhausted()
    }

    /// Returns true if both lots describe the same grant event.
    pub fn same_grant_event(&self, other: &LeaveLot) -> bool {
        self.employee_id == other.employee_id
            && self.fiscal_year == other.fiscal_year
            && self.grant_date == other.grant_date
    }

    /// Returns true if both lots grant the same entitlement, ignoring ids
    /// and usage.
    pub fn same_grant_terms(&self, other: &LeaveLot) -> bool {
        self.same_grant_event(other)
            && self.amount_granted == other.amount_granted
            && self.expiry_date == other.expiry_date
    }

    pub(crate) fn take(&mut self, amount: Decimal) {
        self.amount_remaining -= amount;
    }

    pub(crate) fn restore(&mut self, amount: Decimal) {
        self.amount_remaining += amount;
    }

    /// Marks the lot expired and returns the forfeited remainder.
    pub(crate) fn expire(&mut self) -> Decimal {
        let forfeited = self.amount_remaining;
        self.amount_remaining = Decimal::ZERO;
        self.status = LotStatus::Expired;
        forfeited
    }
}
